/// A subcategory is bound to one parent category; the same name may exist
/// once per category.
#[derive(Debug, Clone)]
pub struct Subcategory {
    pub id: Option<i64>,
    pub name: String,
    pub category_id: i64,
}

impl Subcategory {
    pub fn new(name: String, category_id: i64) -> Self {
        Self {
            id: None,
            name,
            category_id,
        }
    }

    pub fn find_by_id(subcategories: &[Subcategory], id: i64) -> Option<&Subcategory> {
        subcategories.iter().find(|s| s.id == Some(id))
    }

    /// Find by exact name within one parent category.
    pub fn find_by_name_in<'a>(
        subcategories: &'a [Subcategory],
        name: &str,
        category_id: i64,
    ) -> Option<&'a Subcategory> {
        subcategories
            .iter()
            .find(|s| s.category_id == category_id && s.name == name)
    }
}

impl std::fmt::Display for Subcategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
