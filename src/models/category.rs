use super::TxnType;

/// A category is bound to one transaction type; the same name may exist once
/// per type.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub txn_type: TxnType,
}

impl Category {
    pub fn new(name: String, txn_type: TxnType) -> Self {
        Self {
            id: None,
            name,
            txn_type,
        }
    }

    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }

    /// Find by exact name within one transaction type.
    pub fn find_by_name_and_type<'a>(
        categories: &'a [Category],
        name: &str,
        txn_type: TxnType,
    ) -> Option<&'a Category> {
        categories
            .iter()
            .find(|c| c.txn_type == txn_type && c.name == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
