use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::catalog::Catalog;
use crate::db::Database;
use crate::models::{Column, Transaction};
use crate::validate::{self, FieldErrors};

/// Which buffer slot a row reference targets. Committed rows are addressed
/// by persisted id (stable across reloads), pending rows by their position
/// in the pending sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSlot {
    Committed(i64),
    Pending(usize),
}

/// Emitted after each mutation; the presentation layer drains these with
/// [`EditBuffer::take_events`] instead of being called back directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    RowChanged(usize),
    RowsReloaded,
    CatalogRefreshed,
}

/// In-memory overlay over the store: committed rows with persisted identity,
/// pending rows awaiting their first commit, per-field dirty tracking
/// against the original-value cache, and validation errors keyed by visual
/// row index (position in committed ++ pending).
#[derive(Default)]
pub struct EditBuffer {
    pub(crate) committed: Vec<Transaction>,
    pub(crate) pending: Vec<Transaction>,
    pub(crate) dirty: HashSet<i64>,
    pub(crate) dirty_fields: HashMap<i64, HashSet<Column>>,
    pub(crate) errors: HashMap<usize, FieldErrors>,
    pub(crate) original_cache: HashMap<i64, Transaction>,
    pub(crate) events: Vec<ChangeEvent>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer contents with the store's committed rows. Pending
    /// rows, dirty markers, and errors are cleared and the original-value
    /// cache is reseeded.
    pub fn load(&mut self, db: &Database) -> Result<()> {
        self.committed = db.load_all()?;
        self.pending.clear();
        self.dirty.clear();
        self.dirty_fields.clear();
        self.errors.clear();
        self.seed_cache();
        self.events.push(ChangeEvent::RowsReloaded);
        Ok(())
    }

    /// Throw away every uncommitted edit and pending row.
    pub fn discard(&mut self, db: &Database) -> Result<()> {
        self.load(db)
    }

    pub(crate) fn seed_cache(&mut self) {
        self.original_cache.clear();
        for row in &self.committed {
            if let Some(id) = row.id {
                self.original_cache.insert(id, row.clone());
            }
        }
    }

    // ── Row access ────────────────────────────────────────────

    pub fn committed(&self) -> &[Transaction] {
        &self.committed
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn row_count(&self) -> usize {
        self.committed.len() + self.pending.len()
    }

    pub fn row(&self, visual: usize) -> Option<&Transaction> {
        if visual < self.committed.len() {
            self.committed.get(visual)
        } else {
            self.pending.get(visual - self.committed.len())
        }
    }

    pub(crate) fn row_mut(&mut self, visual: usize) -> Option<&mut Transaction> {
        let committed_len = self.committed.len();
        if visual < committed_len {
            self.committed.get_mut(visual)
        } else {
            self.pending.get_mut(visual - committed_len)
        }
    }

    /// Slot for a visual row, or None when the index is out of range.
    pub fn slot_at(&self, visual: usize) -> Option<RowSlot> {
        if visual < self.committed.len() {
            self.committed
                .get(visual)
                .and_then(|row| row.id)
                .map(RowSlot::Committed)
        } else if visual - self.committed.len() < self.pending.len() {
            Some(RowSlot::Pending(visual - self.committed.len()))
        } else {
            None
        }
    }

    /// Current visual index of a slot, or None when the slot no longer
    /// exists (row committed, discarded, or deleted underneath it).
    pub fn resolve(&self, slot: RowSlot) -> Option<usize> {
        match slot {
            RowSlot::Committed(id) => {
                self.committed.iter().position(|row| row.id == Some(id))
            }
            RowSlot::Pending(index) => {
                (index < self.pending.len()).then(|| self.committed.len() + index)
            }
        }
    }

    // ── Pending rows ──────────────────────────────────────────

    /// Append a blank pending row dated today. Returns its visual index.
    pub fn add_blank_row(&mut self) -> usize {
        let mut row = Transaction::blank();
        row.date = chrono::Local::now().format("%Y-%m-%d").to_string();
        self.add_pending(row)
    }

    /// Append a caller-built pending row (e.g. from an entry form).
    pub fn add_pending(&mut self, row: Transaction) -> usize {
        self.pending.push(row);
        let visual = self.row_count() - 1;
        self.events.push(ChangeEvent::RowChanged(visual));
        visual
    }

    /// Drop one pending row, shifting error entries for the rows after it.
    pub fn discard_pending(&mut self, index: usize) -> bool {
        if index >= self.pending.len() {
            return false;
        }
        self.pending.remove(index);
        let removed_visual = self.committed.len() + index;
        let mut shifted = HashMap::new();
        for (visual, errs) in self.errors.drain() {
            match visual.cmp(&removed_visual) {
                std::cmp::Ordering::Less => {
                    shifted.insert(visual, errs);
                }
                std::cmp::Ordering::Equal => {}
                std::cmp::Ordering::Greater => {
                    shifted.insert(visual - 1, errs);
                }
            }
        }
        self.errors = shifted;
        self.events.push(ChangeEvent::RowsReloaded);
        true
    }

    /// Drop all pending rows and their errors.
    pub fn clear_pending(&mut self) {
        let committed_len = self.committed.len();
        self.pending.clear();
        self.errors.retain(|visual, _| *visual < committed_len);
        self.events.push(ChangeEvent::RowsReloaded);
    }

    // ── Dirty tracking ────────────────────────────────────────

    /// Re-derive dirty state for one committed row from the original-value
    /// cache. Maintains the invariant that an id is in `dirty` iff its
    /// dirty-field set is non-empty iff some field differs from the cache.
    pub fn recompute_dirty(&mut self, id: i64) {
        let row = self.committed.iter().find(|t| t.id == Some(id));
        let (Some(row), Some(original)) = (row, self.original_cache.get(&id)) else {
            self.dirty.remove(&id);
            self.dirty_fields.remove(&id);
            return;
        };
        let mut fields = HashSet::new();
        for column in Column::all() {
            if !row.field_eq(original, *column) {
                fields.insert(*column);
            }
        }
        if fields.is_empty() {
            self.dirty.remove(&id);
            self.dirty_fields.remove(&id);
        } else {
            self.dirty.insert(id);
            self.dirty_fields.insert(id, fields);
        }
    }

    pub fn is_dirty(&self, id: i64) -> bool {
        self.dirty.contains(&id)
    }

    pub fn dirty_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.dirty.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn dirty_fields(&self, id: i64) -> Option<&HashSet<Column>> {
        self.dirty_fields.get(&id)
    }

    /// True when closing now would lose work.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.pending.is_empty() || !self.dirty.is_empty()
    }

    // ── Errors ────────────────────────────────────────────────

    pub fn errors_at(&self, visual: usize) -> Option<&FieldErrors> {
        self.errors.get(&visual)
    }

    pub fn error_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.errors.keys().copied().collect();
        rows.sort_unstable();
        rows
    }

    /// Validate one row and set or clear its error entry accordingly.
    pub fn revalidate_row(&mut self, visual: usize, catalog: &Catalog) {
        let Some(row) = self.row(visual) else {
            self.errors.remove(&visual);
            return;
        };
        match validate::validate(row, catalog) {
            Ok(_) => {
                self.errors.remove(&visual);
            }
            Err(errs) => {
                self.errors.insert(visual, errs);
            }
        }
    }

    // ── Events ────────────────────────────────────────────────

    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests;
