#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnType {
    Income,
    Expense,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    /// Strict parse: only the two canonical spellings are transaction types.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Income" => Some(Self::Income),
            "Expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Lenient parse for contexts that must keep going with a usable type.
    pub fn parse_or_expense(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::Expense)
    }

    pub fn all() -> &'static [TxnType] {
        &[Self::Income, Self::Expense]
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
