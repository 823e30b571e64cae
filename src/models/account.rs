#[derive(Debug, Clone)]
pub struct Account {
    pub id: Option<i64>,
    pub name: String,
    pub created_at: String,
}

impl Account {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Find an account by exact name in a slice.
    pub fn find_by_name<'a>(accounts: &'a [Account], name: &str) -> Option<&'a Account> {
        accounts.iter().find(|a| a.name == name)
    }

    pub fn find_by_id(accounts: &[Account], id: i64) -> Option<&Account> {
        accounts.iter().find(|a| a.id == Some(id))
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
