#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::models::Account;

fn fixture() -> (Database, Catalog) {
    let db = Database::open_in_memory().unwrap();
    let account = db.insert_account(&Account::new("Checking".into())).unwrap();
    let category = db.ensure_category("Groceries", crate::models::TxnType::Expense).unwrap();
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
    (db, catalog)
}

fn loaded_buffer(db: &Database) -> EditBuffer {
    let mut buffer = EditBuffer::new();
    buffer.load(db).unwrap();
    buffer
}

// ── Load ──────────────────────────────────────────────────────

#[test]
fn test_load_populates_and_seeds_cache() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);

    assert_eq!(buffer.committed().len(), 2);
    assert!(buffer.pending().is_empty());
    assert!(!buffer.has_unsaved_changes());
    // Newest date first.
    assert_eq!(buffer.committed()[0].name, "Bread");

    let id = buffer.committed()[0].id.unwrap();
    assert!(buffer.original_cache.contains_key(&id));
    assert_eq!(buffer.take_events(), vec![ChangeEvent::RowsReloaded]);
}

// ── Slots ─────────────────────────────────────────────────────

#[test]
fn test_slot_resolution() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    buffer.add_blank_row();

    let committed_id = buffer.committed()[1].id.unwrap();
    assert_eq!(buffer.slot_at(1), Some(RowSlot::Committed(committed_id)));
    assert_eq!(buffer.slot_at(2), Some(RowSlot::Pending(0)));
    assert_eq!(buffer.slot_at(3), None);

    assert_eq!(buffer.resolve(RowSlot::Committed(committed_id)), Some(1));
    assert_eq!(buffer.resolve(RowSlot::Pending(0)), Some(2));
    assert_eq!(buffer.resolve(RowSlot::Pending(1)), None);
    assert_eq!(buffer.resolve(RowSlot::Committed(9999)), None);
}

// ── Pending rows ──────────────────────────────────────────────

#[test]
fn test_add_blank_row_dated_today() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);

    let visual = buffer.add_blank_row();
    assert_eq!(visual, 2);
    let row = buffer.row(visual).unwrap();
    assert!(row.id.is_none());
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert_eq!(row.date, today);
    assert!(buffer.has_unsaved_changes());
}

#[test]
fn test_discard_pending_shifts_error_indices() {
    let (db, catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    let first = buffer.add_blank_row();
    let second = buffer.add_blank_row();

    // Blank rows fail validation, giving each pending row an error entry.
    buffer.revalidate_row(first, &catalog);
    buffer.revalidate_row(second, &catalog);
    assert_eq!(buffer.error_rows(), vec![first, second]);

    assert!(buffer.discard_pending(0));
    assert_eq!(buffer.pending().len(), 1);
    // The surviving row's errors moved down with it.
    assert_eq!(buffer.error_rows(), vec![first]);

    assert!(!buffer.discard_pending(5));
}

#[test]
fn test_clear_pending_keeps_committed_errors() {
    let (db, catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    let pending = buffer.add_blank_row();
    buffer.revalidate_row(pending, &catalog);

    // Break a committed row too.
    buffer.committed[0].name = String::new();
    buffer.revalidate_row(0, &catalog);
    assert_eq!(buffer.error_rows(), vec![0, pending]);

    buffer.clear_pending();
    assert!(buffer.pending().is_empty());
    assert_eq!(buffer.error_rows(), vec![0]);
}

// ── Dirty tracking ────────────────────────────────────────────

#[test]
fn test_dirty_iff_field_differs_from_cache() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    let id = buffer.committed()[0].id.unwrap();

    buffer.committed[0].name = "Sourdough".into();
    buffer.recompute_dirty(id);
    assert!(buffer.is_dirty(id));
    assert_eq!(
        buffer.dirty_fields(id).unwrap().iter().copied().collect::<Vec<_>>(),
        vec![Column::Name]
    );

    // Reverting to the original clears dirty entirely.
    buffer.committed[0].name = "Bread".into();
    buffer.recompute_dirty(id);
    assert!(!buffer.is_dirty(id));
    assert!(buffer.dirty_fields(id).is_none());
}

#[test]
fn test_value_equality_is_quantized() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    let id = buffer.committed()[0].id.unwrap();

    // 5.004 quantizes to 5.00, the persisted value: not a difference.
    buffer.committed[0].value = dec!(5.004);
    buffer.recompute_dirty(id);
    assert!(!buffer.is_dirty(id));

    buffer.committed[0].value = dec!(5.005);
    buffer.recompute_dirty(id);
    assert!(buffer.is_dirty(id));
}

#[test]
fn test_pending_rows_are_never_dirty() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    buffer.add_blank_row();
    assert!(buffer.dirty_ids().is_empty());
    assert!(buffer.has_unsaved_changes());
}

// ── Discard ───────────────────────────────────────────────────

#[test]
fn test_discard_resets_everything() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    let id = buffer.committed()[0].id.unwrap();
    buffer.committed[0].name = "Edited".into();
    buffer.recompute_dirty(id);
    buffer.add_blank_row();

    buffer.discard(&db).unwrap();
    assert_eq!(buffer.committed()[0].name, "Bread");
    assert!(buffer.pending().is_empty());
    assert!(!buffer.has_unsaved_changes());
    assert!(buffer.error_rows().is_empty());
}

// ── Events ────────────────────────────────────────────────────

#[test]
fn test_take_events_drains() {
    let (db, _catalog) = fixture();
    let mut buffer = loaded_buffer(&db);
    buffer.add_blank_row();

    let events = buffer.take_events();
    assert!(events.contains(&ChangeEvent::RowsReloaded));
    assert!(events.contains(&ChangeEvent::RowChanged(2)));
    assert!(buffer.take_events().is_empty());
}
