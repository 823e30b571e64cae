use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use crate::buffer::EditBuffer;
use crate::catalog::Catalog;
use crate::db::{Database, StoreError};
use crate::models::Transaction;
use crate::validate::{self, FieldErrors};

/// Result of one save pass over the commit batch (all pending + dirty rows).
#[derive(Debug)]
pub enum SaveOutcome {
    /// Everything committable committed (including the trivial empty batch).
    FullSuccess,
    /// The valid subset committed; the listed visual rows failed validation
    /// and stay in the buffer with their errors.
    PartialSuccess {
        committed: usize,
        failed_rows: Vec<usize>,
    },
    /// Nothing was committable; the listed visual rows failed validation.
    ValidationFailure { failed_rows: Vec<usize> },
    /// The store rejected the batch. Nothing was written and the buffer is
    /// exactly as the user left it, with validation errors merged in.
    StoreFailure {
        error: StoreError,
        affected_rows: Vec<usize>,
    },
}

/// Validate the whole buffer, commit the valid subset atomically, and
/// reconcile. Validation failures are row-local: they never block other
/// rows and are never lost. A store failure aborts the entire batch and
/// leaves the buffer untouched.
pub fn save(
    buffer: &mut EditBuffer,
    catalog: &Catalog,
    db: &mut Database,
) -> Result<SaveOutcome> {
    let committed_len = buffer.committed.len();

    // 1. Validate every pending row and every dirty committed row
    //    independently.
    let mut valid_inserts: Vec<(usize, Transaction)> = Vec::new();
    let mut valid_updates: Vec<(i64, Transaction)> = Vec::new();
    let mut invalid: HashMap<usize, FieldErrors> = HashMap::new();

    for (index, row) in buffer.pending.iter().enumerate() {
        match validate::validate(row, catalog) {
            Ok(normalized) => valid_inserts.push((index, normalized)),
            Err(errors) => {
                invalid.insert(committed_len + index, errors);
            }
        }
    }

    for id in buffer.dirty_ids() {
        let Some(position) = buffer.committed.iter().position(|t| t.id == Some(id)) else {
            continue;
        };
        match validate::validate(&buffer.committed[position], catalog) {
            Ok(normalized) => valid_updates.push((id, normalized)),
            Err(errors) => {
                invalid.insert(position, errors);
            }
        }
    }

    if valid_inserts.is_empty() && valid_updates.is_empty() {
        if invalid.is_empty() {
            // Nothing to do; saving an unchanged buffer is idempotent.
            return Ok(SaveOutcome::FullSuccess);
        }
        let failed_rows = merge_errors(buffer, invalid);
        return Ok(SaveOutcome::ValidationFailure { failed_rows });
    }

    // 2. One transaction for the whole committable set: all inserts, then
    //    all updates, all-or-nothing.
    let affected_rows: Vec<usize> = valid_inserts
        .iter()
        .map(|(index, _)| committed_len + index)
        .chain(valid_updates.iter().filter_map(|(id, _)| {
            buffer.committed.iter().position(|t| t.id == Some(*id))
        }))
        .collect();
    let insert_rows: Vec<Transaction> =
        valid_inserts.iter().map(|(_, row)| row.clone()).collect();

    match db.commit_batch(&insert_rows, &valid_updates) {
        Ok(count) => {
            debug!(count, "commit batch written");
        }
        Err(error) => {
            warn!(%error, "commit batch aborted, buffer preserved");
            merge_errors(buffer, invalid);
            return Ok(SaveOutcome::StoreFailure {
                error,
                affected_rows,
            });
        }
    }

    // 3. Reconcile: snapshot the rows that failed validation so they
    //    survive the reload, then reload the committed set for fresh
    //    identities and canonical values.
    let committed_count = valid_inserts.len() + valid_updates.len();
    let mut failed_pending: Vec<(Transaction, FieldErrors)> = Vec::new();
    let mut failed_dirty: Vec<(i64, Transaction, FieldErrors)> = Vec::new();
    for (visual, errors) in invalid {
        if visual >= committed_len {
            if let Some(row) = buffer.pending.get(visual - committed_len) {
                failed_pending.push((row.clone(), errors));
            }
        } else if let Some(row) = buffer.committed.get(visual) {
            if let Some(id) = row.id {
                failed_dirty.push((id, row.clone(), errors));
            }
        }
    }

    buffer.load(db)?;

    // 4. Re-attach the failures: dirty rows get their live edits back on
    //    top of the reloaded row, pending rows are re-appended, errors are
    //    re-keyed to the post-reload visual indices.
    let mut failed_rows = Vec::new();
    for (id, live_row, errors) in failed_dirty {
        if let Some(position) = buffer.committed.iter().position(|t| t.id == Some(id)) {
            buffer.committed[position] = live_row;
            buffer.recompute_dirty(id);
            buffer.errors.insert(position, errors);
            failed_rows.push(position);
        }
    }
    for (row, errors) in failed_pending {
        let visual = buffer.committed.len() + buffer.pending.len();
        buffer.pending.push(row);
        buffer.errors.insert(visual, errors);
        failed_rows.push(visual);
    }
    failed_rows.sort_unstable();

    if failed_rows.is_empty() {
        Ok(SaveOutcome::FullSuccess)
    } else {
        Ok(SaveOutcome::PartialSuccess {
            committed: committed_count,
            failed_rows,
        })
    }
}

fn merge_errors(buffer: &mut EditBuffer, invalid: HashMap<usize, FieldErrors>) -> Vec<usize> {
    let mut failed_rows: Vec<usize> = invalid.keys().copied().collect();
    failed_rows.sort_unstable();
    for (visual, errors) in invalid {
        buffer.errors.insert(visual, errors);
    }
    failed_rows
}

#[cfg(test)]
mod tests;
