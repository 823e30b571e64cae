mod account;
mod category;
mod column;
mod subcategory;
mod transaction;
mod txn_type;

pub use account::Account;
pub use category::Category;
pub use column::Column;
pub use subcategory::Subcategory;
pub use transaction::{RelatedFields, Transaction};
pub use txn_type::TxnType;

/// Name of the guaranteed fallback category/subcategory.
pub const UNCATEGORIZED: &str = "UNCATEGORIZED";
