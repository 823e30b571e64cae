#![allow(clippy::unwrap_used)]

use super::*;
use crate::db::Database;
use crate::models::Account;

fn fixture_catalog() -> Catalog {
    let db = Database::open_in_memory().unwrap();
    db.insert_account(&Account::new("Checking".into())).unwrap();
    let salary = db.ensure_category("Salary", TxnType::Income).unwrap();
    db.ensure_subcategory("Base", salary).unwrap();
    Catalog::load(&db).unwrap()
}

#[test]
fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = Defaults::load(&dir.path().join("nope.conf")).unwrap();
    assert!(defaults.get("account").is_none());
}

#[test]
fn test_load_skips_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("defaults.conf");
    std::fs::write(&path, "# last used\n\naccount = Checking\ntype=Income\njunk line\n").unwrap();

    let defaults = Defaults::load(&path).unwrap();
    assert_eq!(defaults.get("account"), Some("Checking"));
    assert_eq!(defaults.get("type"), Some("Income"));
    assert!(defaults.get("junk line").is_none());
}

#[test]
fn test_store_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("defaults.conf");

    let mut defaults = Defaults::default();
    defaults.set("account", "Checking");
    defaults.set("category", "Salary");
    defaults.store(&path).unwrap();

    let reloaded = Defaults::load(&path).unwrap();
    assert_eq!(reloaded.get("account"), Some("Checking"));
    assert_eq!(reloaded.get("category"), Some("Salary"));
}

#[test]
fn test_apply_to_resolves_names() {
    let catalog = fixture_catalog();
    let mut defaults = Defaults::default();
    defaults.set("type", "Income");
    defaults.set("account", "Checking");
    defaults.set("category", "Salary");
    defaults.set("subcategory", "Base");

    let mut row = Transaction::blank();
    defaults.apply_to(&mut row, &catalog);

    assert_eq!(row.txn_type, "Income");
    assert_eq!(row.account, "Checking");
    assert!(row.account_id.is_some());
    assert_eq!(row.category, "Salary");
    assert_eq!(row.subcategory, "Base");
    assert!(row.subcategory_id.is_some());
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert_eq!(row.date, today);
}

#[test]
fn test_apply_to_skips_stale_names() {
    let catalog = fixture_catalog();
    let mut defaults = Defaults::default();
    defaults.set("type", "Transfer");
    defaults.set("account", "Closed Account");
    defaults.set("category", "Salary");

    let mut row = Transaction::blank();
    defaults.apply_to(&mut row, &catalog);

    // Unparseable type leaves the blank-row default in place, and "Salary"
    // is an Income category so it does not resolve against Expense.
    assert_eq!(row.txn_type, "Expense");
    assert!(row.account_id.is_none());
    assert!(row.category_id.is_none());
}

#[test]
fn test_apply_to_keeps_existing_date() {
    let catalog = fixture_catalog();
    let defaults = Defaults::default();
    let mut row = Transaction::blank();
    row.date = "2024-01-15".into();
    defaults.apply_to(&mut row, &catalog);
    assert_eq!(row.date, "2024-01-15");
}
