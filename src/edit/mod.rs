use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::debug;

use crate::buffer::{ChangeEvent, EditBuffer, RowSlot};
use crate::catalog::Catalog;
use crate::db::Database;
use crate::models::{Column, RelatedFields, Transaction, TxnType, UNCATEGORIZED};

/// One reversible cell edit. Forward application coerces and derives the
/// cascaded fields; reverse application restores the snapshot taken when the
/// edit was applied. Cascades are not invertible by re-derivation, so undo
/// must be a literal restoration.
pub struct EditCommand {
    slot: Option<RowSlot>,
    column: Column,
    old: String,
    new: String,
    before: Option<RelatedFields>,
    after: Option<RelatedFields>,
    invalid: bool,
}

impl EditCommand {
    /// Build a command for a raw `(row, column, old, new)` tuple from the
    /// grid. The row reference is resolved to a slot immediately; a
    /// reference to a row that no longer exists yields an invalid command.
    pub fn new(
        buffer: &EditBuffer,
        visual_row: usize,
        column: Column,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        let slot = buffer.slot_at(visual_row);
        Self {
            slot,
            column,
            old: old.into(),
            new: new.into(),
            before: None,
            after: None,
            invalid: slot.is_none(),
        }
    }

    /// Invalid commands must never be applied or pushed onto the log.
    pub fn is_valid(&self) -> bool {
        !self.invalid
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn slot(&self) -> Option<RowSlot> {
        self.slot
    }

    /// Apply the new value: snapshot related fields, coerce the primary
    /// value into the target field, run cascades, then recompute dirty and
    /// error state. A failed coercion marks the command invalid and leaves
    /// the row untouched.
    pub fn redo(
        &mut self,
        buffer: &mut EditBuffer,
        catalog: &mut Catalog,
        db: &Database,
    ) -> Result<()> {
        if self.invalid {
            bail!("command is invalid and cannot be applied");
        }
        let slot = self.slot.ok_or_else(|| anyhow!("command has no slot"))?;
        let Some(visual) = buffer.resolve(slot) else {
            self.invalid = true;
            bail!("row no longer exists");
        };

        let before = buffer
            .row(visual)
            .map(Transaction::related)
            .ok_or_else(|| anyhow!("row no longer exists"))?;

        {
            let row = buffer
                .row_mut(visual)
                .ok_or_else(|| anyhow!("row no longer exists"))?;
            if let Err(message) = coerce_into(row, self.column, &self.new, catalog) {
                self.invalid = true;
                bail!("{message}");
            }
        }
        self.before = Some(before.clone());

        cascade(buffer, visual, self.column, &before, catalog, db)?;

        self.after = buffer.row(visual).map(Transaction::related);

        if let RowSlot::Committed(id) = slot {
            buffer.recompute_dirty(id);
        }
        buffer.revalidate_row(visual, catalog);
        buffer.events.push(ChangeEvent::RowChanged(visual));
        Ok(())
    }

    /// Re-apply the old primary value, then force-restore all four related
    /// fields from the snapshot captured during redo.
    pub fn undo(&mut self, buffer: &mut EditBuffer, catalog: &Catalog) -> Result<()> {
        if self.invalid {
            bail!("command is invalid and cannot be applied");
        }
        let slot = self.slot.ok_or_else(|| anyhow!("command has no slot"))?;
        let Some(visual) = buffer.resolve(slot) else {
            self.invalid = true;
            bail!("row no longer exists");
        };
        let before = self
            .before
            .clone()
            .ok_or_else(|| anyhow!("undo before any redo"))?;

        {
            let row = buffer
                .row_mut(visual)
                .ok_or_else(|| anyhow!("row no longer exists"))?;
            restore_primary(row, self.column, &self.old);
            row.restore_related(&before);
        }

        if let RowSlot::Committed(id) = slot {
            buffer.recompute_dirty(id);
        }
        buffer.revalidate_row(visual, catalog);
        buffer.events.push(ChangeEvent::RowChanged(visual));
        Ok(())
    }
}

/// Coerce a raw cell value into the typed field. References resolve by name
/// against the catalog; an unresolvable value is a coercion failure and the
/// row is left untouched.
fn coerce_into(
    row: &mut Transaction,
    column: Column,
    raw: &str,
    catalog: &Catalog,
) -> std::result::Result<(), String> {
    match column {
        Column::Name => row.name = raw.trim().to_string(),
        Column::Description => row.description = raw.to_string(),
        Column::Value => match Decimal::from_str(raw.trim()) {
            Ok(value) => {
                row.value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            }
            Err(_) => return Err(format!("'{raw}' is not a number")),
        },
        Column::Type => match TxnType::parse(raw) {
            Some(txn_type) => row.txn_type = txn_type.as_str().to_string(),
            None => return Err(format!("type must be Income or Expense, not '{raw}'")),
        },
        Column::Date => {
            let trimmed = raw.trim();
            if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err() {
                return Err(format!("date must be YYYY-MM-DD, not '{raw}'"));
            }
            row.date = trimmed.to_string();
        }
        Column::Account => match catalog.account_by_name(raw.trim()) {
            Some(account) => {
                row.account_id = account.id;
                row.account = account.name.clone();
            }
            None => return Err(format!("unknown account '{raw}'")),
        },
        Column::Category => {
            let txn_type = TxnType::parse_or_expense(&row.txn_type);
            match catalog.category_by_name_and_type(raw.trim(), txn_type) {
                Some(category) => {
                    row.category_id = category.id;
                    row.category = category.name.clone();
                }
                None => return Err(format!("unknown {txn_type} category '{raw}'")),
            }
        }
        Column::Subcategory => {
            let Some(category_id) = row.category_id else {
                return Err("select a category before a subcategory".to_string());
            };
            match catalog.subcategory_by_name_in(raw.trim(), category_id) {
                Some(sub) => {
                    row.subcategory_id = sub.id;
                    row.subcategory = sub.name.clone();
                }
                None => return Err(format!("unknown subcategory '{raw}'")),
            }
        }
    }
    Ok(())
}

/// Literal re-application of an old raw value for undo. Related columns are
/// skipped here; the snapshot restore that follows covers them.
fn restore_primary(row: &mut Transaction, column: Column, raw: &str) {
    match column {
        Column::Name => row.name = raw.to_string(),
        Column::Description => row.description = raw.to_string(),
        Column::Date => row.date = raw.to_string(),
        Column::Value => {
            row.value = Decimal::from_str(raw.trim())
                .unwrap_or_default()
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        }
        Column::Type | Column::Account | Column::Category | Column::Subcategory => {}
    }
}

/// Dependent-field resets, triggered only when the edit actually moved the
/// field away from its pre-edit snapshot. A type change re-homes the row on
/// the UNCATEGORIZED category for the new type and its UNCATEGORIZED
/// subcategory; a category change re-homes the subcategory.
fn cascade(
    buffer: &mut EditBuffer,
    visual: usize,
    column: Column,
    before: &RelatedFields,
    catalog: &mut Catalog,
    db: &Database,
) -> Result<()> {
    match column {
        Column::Type => {
            let new_type = {
                let Some(row) = buffer.row(visual) else {
                    return Ok(());
                };
                if row.txn_type == before.txn_type {
                    return Ok(());
                }
                TxnType::parse_or_expense(&row.txn_type)
            };
            let category_id = catalog.ensure_uncategorized(new_type, db)?;
            let subcategory_id = catalog.ensure_uncategorized_subcategory(category_id, db)?;
            if let Some(row) = buffer.row_mut(visual) {
                row.category_id = Some(category_id);
                row.category = UNCATEGORIZED.to_string();
                row.subcategory_id = Some(subcategory_id);
                row.subcategory = UNCATEGORIZED.to_string();
            }
            debug!(
                txn_type = new_type.as_str(),
                category_id, subcategory_id, "type edit cascaded to sentinels"
            );
        }
        Column::Category => {
            let category_id = {
                let Some(row) = buffer.row(visual) else {
                    return Ok(());
                };
                if row.category_id == before.category_id {
                    return Ok(());
                }
                row.category_id
            };
            let Some(category_id) = category_id else {
                return Ok(());
            };
            let subcategory_id = catalog.ensure_uncategorized_subcategory(category_id, db)?;
            if let Some(row) = buffer.row_mut(visual) {
                row.subcategory_id = Some(subcategory_id);
                row.subcategory = UNCATEGORIZED.to_string();
            }
            debug!(category_id, subcategory_id, "category edit cascaded to sentinel");
        }
        _ => {}
    }
    Ok(())
}

/// Linear undo/redo stack. Pushing a new command after undos discards the
/// redo tail; history is capped so an editing marathon cannot grow without
/// bound.
pub struct CommandLog {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
    max_entries: usize,
}

impl CommandLog {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: 100,
        }
    }

    /// Apply a fresh command and push it. A command that fails application
    /// is dropped and never recorded.
    pub fn apply(
        &mut self,
        mut command: EditCommand,
        buffer: &mut EditBuffer,
        catalog: &mut Catalog,
        db: &Database,
    ) -> Result<()> {
        command.redo(buffer, catalog, db)?;
        self.redo_stack.clear();
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
        Ok(())
    }

    /// Undo the most recent command. Returns false when there is nothing to
    /// undo; a command whose row has vanished is dropped silently.
    pub fn undo(&mut self, buffer: &mut EditBuffer, catalog: &Catalog) -> Result<bool> {
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match command.undo(buffer, catalog) {
            Ok(()) => {
                self.redo_stack.push(command);
                Ok(true)
            }
            Err(err) => {
                if command.is_valid() {
                    return Err(err);
                }
                debug!("dropping stale undo entry: {err}");
                Ok(false)
            }
        }
    }

    /// Re-apply the most recently undone command. Returns false when there
    /// is nothing to redo.
    pub fn redo(
        &mut self,
        buffer: &mut EditBuffer,
        catalog: &mut Catalog,
        db: &Database,
    ) -> Result<bool> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match command.redo(buffer, catalog, db) {
            Ok(()) => {
                self.undo_stack.push(command);
                Ok(true)
            }
            Err(err) => {
                if command.is_valid() {
                    return Err(err);
                }
                debug!("dropping stale redo entry: {err}");
                Ok(false)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new()
    }
}
