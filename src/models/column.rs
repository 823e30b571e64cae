/// The fixed set of editable grid columns. Coercion and cascade behavior is
/// selected by matching on this enum rather than per-column editor objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Name,
    Value,
    Type,
    Account,
    Category,
    Subcategory,
    Description,
    Date,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Value => "value",
            Self::Type => "type",
            Self::Account => "account",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::Description => "description",
            Self::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "value" => Some(Self::Value),
            "type" => Some(Self::Type),
            "account" => Some(Self::Account),
            "category" => Some(Self::Category),
            "subcategory" => Some(Self::Subcategory),
            "description" => Some(Self::Description),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn all() -> &'static [Column] {
        &[
            Self::Name,
            Self::Value,
            Self::Type,
            Self::Account,
            Self::Category,
            Self::Subcategory,
            Self::Description,
            Self::Date,
        ]
    }

    /// Columns covered by the related-fields snapshot taken around each edit.
    pub fn is_related(&self) -> bool {
        matches!(
            self,
            Self::Type | Self::Account | Self::Category | Self::Subcategory
        )
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
