#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::models::{Account, Column, TxnType};

fn fixture() -> (Database, Catalog, EditBuffer) {
    let db = Database::open_in_memory().unwrap();
    let account = db.insert_account(&Account::new("Checking".into())).unwrap();
    let category = db.ensure_category("Groceries", TxnType::Expense).unwrap();
    let subcategory = db.ensure_subcategory("Food", category).unwrap();

    for (name, date) in [("Milk", "2024-01-10"), ("Bread", "2024-01-12")] {
        let mut row = Transaction::blank();
        row.name = name.into();
        row.value = dec!(5.00);
        row.account_id = Some(account);
        row.category_id = Some(category);
        row.subcategory_id = Some(subcategory);
        row.date = date.into();
        db.insert_transaction(&row).unwrap();
    }

    let catalog = Catalog::load(&db).unwrap();
    let mut buffer = EditBuffer::new();
    buffer.load(&db).unwrap();
    (db, catalog, buffer)
}

fn valid_pending() -> Transaction {
    let mut row = Transaction::blank();
    row.name = "Coffee".into();
    row.value = dec!(3.75);
    row.account = "Checking".into();
    row.category = "Groceries".into();
    row.subcategory = "Food".into();
    row.date = "2024-02-01".into();
    row
}

// ── Trivial and all-valid batches ─────────────────────────────

#[test]
fn test_unchanged_buffer_is_a_noop() {
    let (mut db, catalog, mut buffer) = fixture();
    let outcome = save(&mut buffer, &catalog, &mut db).unwrap();
    assert!(matches!(outcome, SaveOutcome::FullSuccess));
    assert_eq!(db.load_all().unwrap().len(), 2);
}

#[test]
fn test_valid_pending_row_commits_and_gains_identity() {
    let (mut db, catalog, mut buffer) = fixture();
    buffer.add_pending(valid_pending());

    let outcome = save(&mut buffer, &catalog, &mut db).unwrap();
    assert!(matches!(outcome, SaveOutcome::FullSuccess));

    assert!(buffer.pending().is_empty());
    assert!(!buffer.has_unsaved_changes());
    let committed = buffer
        .committed()
        .iter()
        .find(|t| t.name == "Coffee")
        .unwrap();
    assert!(committed.id.is_some());
    // Display names were resolved at validation time.
    assert_eq!(committed.account, "Checking");
    assert_eq!(db.load_all().unwrap().len(), 3);
}

#[test]
fn test_dirty_row_commits_and_becomes_clean() {
    let (mut db, catalog, mut buffer) = fixture();
    let id = buffer.committed()[0].id.unwrap();
    buffer.committed[0].name = "Sourdough".into();
    buffer.recompute_dirty(id);

    let outcome = save(&mut buffer, &catalog, &mut db).unwrap();
    assert!(matches!(outcome, SaveOutcome::FullSuccess));
    assert!(!buffer.is_dirty(id));
    let persisted = db
        .load_all()
        .unwrap()
        .into_iter()
        .find(|t| t.id == Some(id))
        .unwrap();
    assert_eq!(persisted.name, "Sourdough");
}

#[test]
fn test_value_quantized_on_the_way_to_the_store() {
    let (mut db, catalog, mut buffer) = fixture();
    let mut row = valid_pending();
    row.value = dec!(12.345);
    buffer.add_pending(row);

    save(&mut buffer, &catalog, &mut db).unwrap();
    let persisted = db
        .load_all()
        .unwrap()
        .into_iter()
        .find(|t| t.name == "Coffee")
        .unwrap();
    assert_eq!(persisted.value, dec!(12.35));
}

// ── Validation failures ───────────────────────────────────────

#[test]
fn test_nothing_committable_is_a_validation_failure() {
    let (mut db, catalog, mut buffer) = fixture();
    let visual = buffer.add_blank_row();

    let outcome = save(&mut buffer, &catalog, &mut db).unwrap();
    let SaveOutcome::ValidationFailure { failed_rows } = outcome else {
        panic!("expected ValidationFailure");
    };
    assert_eq!(failed_rows, vec![visual]);
    // The row stays in the buffer with its errors; nothing was written.
    assert_eq!(buffer.pending().len(), 1);
    assert!(buffer.errors_at(visual).unwrap().contains_key(&Column::Name));
    assert_eq!(db.load_all().unwrap().len(), 2);
}

#[test]
fn test_partial_success_commits_valid_keeps_invalid() {
    let (mut db, catalog, mut buffer) = fixture();
    buffer.add_pending(valid_pending());
    let mut broken = valid_pending();
    broken.name = "Snack".into();
    broken.account = "Offshore".into();
    buffer.add_pending(broken);

    let outcome = save(&mut buffer, &catalog, &mut db).unwrap();
    let SaveOutcome::PartialSuccess {
        committed,
        failed_rows,
    } = outcome
    else {
        panic!("expected PartialSuccess");
    };
    assert_eq!(committed, 1);

    // The valid row moved into the committed set, the broken one was
    // re-appended after the reload with its errors re-keyed.
    assert_eq!(buffer.committed().len(), 3);
    assert_eq!(buffer.pending().len(), 1);
    assert_eq!(buffer.pending()[0].name, "Snack");
    assert_eq!(failed_rows, vec![3]);
    assert!(buffer.errors_at(3).unwrap().contains_key(&Column::Account));
    assert_eq!(db.load_all().unwrap().len(), 3);
}

#[test]
fn test_invalid_dirty_row_keeps_live_edits() {
    let (mut db, catalog, mut buffer) = fixture();
    let bad_id = buffer.committed()[0].id.unwrap();
    let good_id = buffer.committed()[1].id.unwrap();
    buffer.committed[0].name = String::new();
    buffer.recompute_dirty(bad_id);
    buffer.committed[1].name = "Whole Milk".into();
    buffer.recompute_dirty(good_id);

    let outcome = save(&mut buffer, &catalog, &mut db).unwrap();
    let SaveOutcome::PartialSuccess {
        committed,
        failed_rows,
    } = outcome
    else {
        panic!("expected PartialSuccess");
    };
    assert_eq!(committed, 1);
    assert_eq!(failed_rows.len(), 1);

    // The failed row still shows the user's edit, stays dirty, and carries
    // its errors; the valid edit was persisted.
    let position = failed_rows[0];
    assert_eq!(buffer.committed()[position].id, Some(bad_id));
    assert_eq!(buffer.committed()[position].name, "");
    assert!(buffer.is_dirty(bad_id));
    assert!(buffer.errors_at(position).unwrap().contains_key(&Column::Name));
    assert!(!buffer.is_dirty(good_id));
    let persisted = db
        .load_all()
        .unwrap()
        .into_iter()
        .find(|t| t.id == Some(good_id))
        .unwrap();
    assert_eq!(persisted.name, "Whole Milk");
}

// ── Store failures ────────────────────────────────────────────

#[test]
fn test_store_failure_aborts_batch_and_preserves_buffer() {
    let (mut db, catalog, mut buffer) = fixture();
    let id = buffer.committed()[0].id.unwrap();
    buffer.committed[0].name = "Edited".into();
    buffer.recompute_dirty(id);
    buffer.add_pending(valid_pending());

    // The dirty row vanishes from the store behind the buffer's back, so
    // its update hits zero rows and aborts the whole batch.
    db.delete_transactions(&[id]).unwrap();

    let outcome = save(&mut buffer, &catalog, &mut db).unwrap();
    let SaveOutcome::StoreFailure {
        error,
        affected_rows,
    } = outcome
    else {
        panic!("expected StoreFailure");
    };
    assert_eq!(error.op, "update");
    assert_eq!(affected_rows.len(), 2);

    // The valid insert was rolled back with the rest of the batch and the
    // buffer is exactly as the user left it.
    assert_eq!(db.load_all().unwrap().len(), 1);
    assert_eq!(buffer.pending().len(), 1);
    assert_eq!(buffer.committed()[0].name, "Edited");
    assert!(buffer.is_dirty(id));
}
