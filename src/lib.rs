//! Edit-buffer and commit engine for an interactive transaction ledger grid.
//!
//! The grid widget itself lives elsewhere; this crate owns everything the
//! widget edits: the overlay of committed and pending rows
//! ([`buffer::EditBuffer`]), the undo/redo command log with its
//! type → category → subcategory cascades ([`edit::CommandLog`]), row
//! validation against the reference catalog ([`validate::validate`]), and
//! the all-or-nothing save pass ([`save::save`]).

pub mod buffer;
pub mod catalog;
pub mod db;
pub mod defaults;
pub mod edit;
pub mod models;
pub mod save;
pub mod validate;

pub use buffer::{ChangeEvent, EditBuffer, RowSlot};
pub use catalog::Catalog;
pub use db::{Database, StoreError};
pub use defaults::Defaults;
pub use edit::{CommandLog, EditCommand};
pub use models::{
    Account, Category, Column, Subcategory, Transaction, TxnType, UNCATEGORIZED,
};
pub use save::{save, SaveOutcome};
pub use validate::{validate, FieldErrors};
