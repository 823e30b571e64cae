mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Account, Category, Subcategory, Transaction, TxnType};

/// A failed store operation, with enough context to tell the user which part
/// of the commit batch broke. The batch it belonged to is never partially
/// applied.
#[derive(Debug, Clone, Error)]
#[error("store {op} failed: {message}")]
pub struct StoreError {
    pub op: &'static str,
    pub message: String,
}

impl StoreError {
    fn new(op: &'static str, err: rusqlite::Error) -> Self {
        Self {
            op,
            message: err.to_string(),
        }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    const SELECT_ROWS: &str = "SELECT t.id, t.name, t.value, t.txn_type,
            t.account_id, a.name, t.category_id, c.name, t.subcategory_id, s.name,
            t.description, t.date
     FROM transactions t
     JOIN accounts a ON t.account_id = a.id
     JOIN categories c ON t.category_id = c.id
     JOIN subcategories s ON t.subcategory_id = s.id";

    /// All rows in grid order: newest date first, ties broken by newest id.
    /// The edit buffer preserves this order.
    pub fn load_all(&self) -> Result<Vec<Transaction>> {
        let sql = format!("{} ORDER BY t.date DESC, t.id DESC", Self::SELECT_ROWS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let value_str: String = row.get(2)?;
            Ok(Transaction {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                value: Decimal::from_str(&value_str).unwrap_or_default(),
                txn_type: row.get(3)?,
                account_id: Some(row.get(4)?),
                account: row.get(5)?,
                category_id: Some(row.get(6)?),
                category: row.get(7)?,
                subcategory_id: Some(row.get(8)?),
                subcategory: row.get(9)?,
                description: row.get(10)?,
                date: row.get(11)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        let values = insert_params(txn)?;
        self.conn.execute(
            "INSERT INTO transactions (name, value, txn_type, account_id, category_id, subcategory_id, description, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params_ref(&values).as_slice(),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Returns false when no row with the given id exists.
    pub fn update_transaction(&self, id: i64, txn: &Transaction) -> Result<bool> {
        let mut values = update_params(txn)?;
        values.push(Box::new(id));
        let changed = self.conn.execute(
            "UPDATE transactions SET name = ?1, value = ?2, txn_type = ?3, account_id = ?4,
                    category_id = ?5, subcategory_id = ?6, description = ?7, date = ?8
             WHERE id = ?9",
            params_ref(&values).as_slice(),
        )?;
        Ok(changed > 0)
    }

    pub fn delete_transactions(&self, ids: &[i64]) -> Result<usize> {
        let mut count = 0;
        for id in ids {
            count += self
                .conn
                .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        }
        Ok(count)
    }

    /// All inserts, then all updates, in one transaction. Any single failure
    /// rolls the whole batch back.
    pub fn commit_batch(
        &mut self,
        inserts: &[Transaction],
        updates: &[(i64, Transaction)],
    ) -> std::result::Result<usize, StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| StoreError::new("begin", e))?;

        for txn in inserts {
            let values = insert_params(txn)?;
            tx.execute(
                "INSERT INTO transactions (name, value, txn_type, account_id, category_id, subcategory_id, description, date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params_ref(&values).as_slice(),
            )
            .map_err(|e| StoreError::new("insert", e))?;
        }

        for (id, txn) in updates {
            let mut values = update_params(txn)?;
            values.push(Box::new(*id));
            let changed = tx
                .execute(
                    "UPDATE transactions SET name = ?1, value = ?2, txn_type = ?3, account_id = ?4,
                            category_id = ?5, subcategory_id = ?6, description = ?7, date = ?8
                     WHERE id = ?9",
                    params_ref(&values).as_slice(),
                )
                .map_err(|e| StoreError::new("update", e))?;
            if changed == 0 {
                return Err(StoreError {
                    op: "update",
                    message: format!("row {id} no longer exists"),
                });
            }
        }

        tx.commit().map_err(|e| StoreError::new("commit", e))?;
        Ok(inserts.len() + updates.len())
    }

    // ── Accounts ──────────────────────────────────────────────

    pub fn insert_account(&self, account: &Account) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO accounts (name, created_at) VALUES (?1, ?2)",
            params![account.name, account.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM accounts ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Account {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Categories ────────────────────────────────────────────

    pub fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, txn_type FROM categories ORDER BY txn_type, name")?;
        let rows = stmt.query_map([], |row| {
            let type_str: String = row.get(2)?;
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                txn_type: TxnType::parse_or_expense(&type_str),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Fetch-or-create by (name, type). Safe to call repeatedly.
    pub fn ensure_category(&self, name: &str, txn_type: TxnType) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO categories (name, txn_type) VALUES (?1, ?2)",
            params![name, txn_type.as_str()],
        )?;
        Ok(self.conn.query_row(
            "SELECT id FROM categories WHERE name = ?1 AND txn_type = ?2",
            params![name, txn_type.as_str()],
            |row| row.get(0),
        )?)
    }

    // ── Subcategories ─────────────────────────────────────────

    pub fn get_subcategories(&self) -> Result<Vec<Subcategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, category_id FROM subcategories ORDER BY category_id, name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Subcategory {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                category_id: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Fetch-or-create by (name, category). Safe to call repeatedly.
    pub fn ensure_subcategory(&self, name: &str, category_id: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO subcategories (name, category_id) VALUES (?1, ?2)",
            params![name, category_id],
        )?;
        Ok(self.conn.query_row(
            "SELECT id FROM subcategories WHERE name = ?1 AND category_id = ?2",
            params![name, category_id],
            |row| row.get(0),
        )?)
    }
}

type ParamValues = Vec<Box<dyn rusqlite::types::ToSql>>;

fn params_ref(values: &ParamValues) -> Vec<&dyn rusqlite::types::ToSql> {
    values.iter().map(|v| v.as_ref()).collect()
}

fn ref_id(id: Option<i64>, field: &'static str) -> std::result::Result<i64, StoreError> {
    id.ok_or(StoreError {
        op: "bind",
        message: format!("row has no resolved {field} id"),
    })
}

fn update_params(txn: &Transaction) -> std::result::Result<ParamValues, StoreError> {
    Ok(vec![
        Box::new(txn.name.clone()),
        Box::new(txn.quantized_value().to_string()),
        Box::new(txn.txn_type.clone()),
        Box::new(ref_id(txn.account_id, "account")?),
        Box::new(ref_id(txn.category_id, "category")?),
        Box::new(ref_id(txn.subcategory_id, "subcategory")?),
        Box::new(txn.description.clone()),
        Box::new(txn.date.clone()),
    ])
}

fn insert_params(txn: &Transaction) -> std::result::Result<ParamValues, StoreError> {
    let mut values = update_params(txn)?;
    values.push(Box::new(chrono::Utc::now().to_rfc3339()));
    Ok(values)
}
