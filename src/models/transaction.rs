use rust_decimal::{Decimal, RoundingStrategy};

use super::Column;

/// A ledger row. `id: Some(_)` means the row has persisted identity
/// (committed); `id: None` means it is pending and becomes committed only
/// after a successful save. The three references carry both the store id and
/// the display name so either direction can be normalized.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub name: String,
    pub value: Decimal,
    pub txn_type: String,
    pub account_id: Option<i64>,
    pub account: String,
    pub category_id: Option<i64>,
    pub category: String,
    pub subcategory_id: Option<i64>,
    pub subcategory: String,
    pub description: String,
    pub date: String,
}

/// Snapshot of the four fields the type/category cascades can touch,
/// captured before an edit so undo can restore them literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedFields {
    pub txn_type: String,
    pub account_id: Option<i64>,
    pub account: String,
    pub category_id: Option<i64>,
    pub category: String,
    pub subcategory_id: Option<i64>,
    pub subcategory: String,
}

impl Transaction {
    pub fn blank() -> Self {
        Self {
            id: None,
            name: String::new(),
            value: Decimal::ZERO,
            txn_type: super::TxnType::Expense.as_str().to_string(),
            account_id: None,
            account: String::new(),
            category_id: None,
            category: String::new(),
            subcategory_id: None,
            subcategory: String::new(),
            description: String::new(),
            date: String::new(),
        }
    }

    /// Value at the 2-digit money precision the store persists, rounding
    /// half-up (12.345 -> 12.35).
    pub fn quantized_value(&self) -> Decimal {
        self.value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Raw text of one cell as the grid shows it.
    pub fn field_text(&self, column: Column) -> String {
        match column {
            Column::Name => self.name.clone(),
            Column::Value => self.quantized_value().to_string(),
            Column::Type => self.txn_type.clone(),
            Column::Account => self.account.clone(),
            Column::Category => self.category.clone(),
            Column::Subcategory => self.subcategory.clone(),
            Column::Description => self.description.clone(),
            Column::Date => self.date.clone(),
        }
    }

    pub fn related(&self) -> RelatedFields {
        RelatedFields {
            txn_type: self.txn_type.clone(),
            account_id: self.account_id,
            account: self.account.clone(),
            category_id: self.category_id,
            category: self.category.clone(),
            subcategory_id: self.subcategory_id,
            subcategory: self.subcategory.clone(),
        }
    }

    pub fn restore_related(&mut self, snapshot: &RelatedFields) {
        self.txn_type = snapshot.txn_type.clone();
        self.account_id = snapshot.account_id;
        self.account = snapshot.account.clone();
        self.category_id = snapshot.category_id;
        self.category = snapshot.category.clone();
        self.subcategory_id = snapshot.subcategory_id;
        self.subcategory = snapshot.subcategory.clone();
    }

    /// Column-aware equality: value compares at 2-digit quantization,
    /// references compare by id, everything else by string.
    pub fn field_eq(&self, other: &Transaction, column: Column) -> bool {
        match column {
            Column::Name => self.name == other.name,
            Column::Value => self.quantized_value() == other.quantized_value(),
            Column::Type => self.txn_type == other.txn_type,
            Column::Account => self.account_id == other.account_id,
            Column::Category => self.category_id == other.category_id,
            Column::Subcategory => self.subcategory_id == other.subcategory_id,
            Column::Description => self.description == other.description,
            Column::Date => self.date == other.date,
        }
    }
}
