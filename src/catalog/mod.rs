use anyhow::Result;
use tracing::warn;

use crate::db::Database;
use crate::models::{Account, Category, Subcategory, TxnType, UNCATEGORIZED};

/// Read-mostly snapshot of the reference tables. Commands and the validator
/// resolve names and ids through this one struct; the only mutations are
/// sentinel creation, which writes through to the store and updates the
/// cache in the same call.
pub struct Catalog {
    accounts: Vec<Account>,
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
}

impl Catalog {
    /// Load the reference tables and heal missing UNCATEGORIZED sentinels:
    /// after this returns, every transaction type has one and every category
    /// has one.
    pub fn load(db: &Database) -> Result<Self> {
        let mut catalog = Self {
            accounts: db.get_accounts()?,
            categories: db.get_categories()?,
            subcategories: db.get_subcategories()?,
        };
        catalog.heal(db)?;
        Ok(catalog)
    }

    pub fn refresh(&mut self, db: &Database) -> Result<()> {
        *self = Self::load(db)?;
        Ok(())
    }

    fn heal(&mut self, db: &Database) -> Result<()> {
        for txn_type in TxnType::all() {
            if Category::find_by_name_and_type(&self.categories, UNCATEGORIZED, *txn_type)
                .is_none()
            {
                warn!(
                    txn_type = txn_type.as_str(),
                    "missing UNCATEGORIZED category, creating it"
                );
                let id = db.ensure_category(UNCATEGORIZED, *txn_type)?;
                self.categories.push(Category {
                    id: Some(id),
                    name: UNCATEGORIZED.to_string(),
                    txn_type: *txn_type,
                });
            }
        }

        let category_ids: Vec<i64> = self.categories.iter().filter_map(|c| c.id).collect();
        for category_id in category_ids {
            if Subcategory::find_by_name_in(&self.subcategories, UNCATEGORIZED, category_id)
                .is_none()
            {
                warn!(category_id, "missing UNCATEGORIZED subcategory, creating it");
                let id = db.ensure_subcategory(UNCATEGORIZED, category_id)?;
                self.subcategories.push(Subcategory {
                    id: Some(id),
                    name: UNCATEGORIZED.to_string(),
                    category_id,
                });
            }
        }

        Ok(())
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn subcategories(&self) -> &[Subcategory] {
        &self.subcategories
    }

    // ── Sentinels ─────────────────────────────────────────────

    /// Id of the UNCATEGORIZED category for the given type, creating it if
    /// the store lost it since load. Idempotent.
    pub fn ensure_uncategorized(&mut self, txn_type: TxnType, db: &Database) -> Result<i64> {
        if let Some(id) = Category::find_by_name_and_type(&self.categories, UNCATEGORIZED, txn_type)
            .and_then(|c| c.id)
        {
            return Ok(id);
        }
        warn!(
            txn_type = txn_type.as_str(),
            "missing UNCATEGORIZED category, creating it"
        );
        let id = db.ensure_category(UNCATEGORIZED, txn_type)?;
        self.categories.push(Category {
            id: Some(id),
            name: UNCATEGORIZED.to_string(),
            txn_type,
        });
        Ok(id)
    }

    /// Id of the UNCATEGORIZED subcategory of the given category, creating it
    /// if absent. Idempotent.
    pub fn ensure_uncategorized_subcategory(
        &mut self,
        category_id: i64,
        db: &Database,
    ) -> Result<i64> {
        if let Some(id) =
            Subcategory::find_by_name_in(&self.subcategories, UNCATEGORIZED, category_id)
                .and_then(|s| s.id)
        {
            return Ok(id);
        }
        warn!(category_id, "missing UNCATEGORIZED subcategory, creating it");
        let id = db.ensure_subcategory(UNCATEGORIZED, category_id)?;
        self.subcategories.push(Subcategory {
            id: Some(id),
            name: UNCATEGORIZED.to_string(),
            category_id,
        });
        Ok(id)
    }

    // ── Lookups ───────────────────────────────────────────────

    pub fn account_by_id(&self, id: i64) -> Option<&Account> {
        Account::find_by_id(&self.accounts, id)
    }

    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        Account::find_by_name(&self.accounts, name)
    }

    pub fn category_by_id(&self, id: i64) -> Option<&Category> {
        Category::find_by_id(&self.categories, id)
    }

    pub fn category_by_name_and_type(&self, name: &str, txn_type: TxnType) -> Option<&Category> {
        Category::find_by_name_and_type(&self.categories, name, txn_type)
    }

    pub fn subcategory_by_id(&self, id: i64) -> Option<&Subcategory> {
        Subcategory::find_by_id(&self.subcategories, id)
    }

    pub fn subcategory_by_name_in(&self, name: &str, category_id: i64) -> Option<&Subcategory> {
        Subcategory::find_by_name_in(&self.subcategories, name, category_id)
    }

    // ── Display helpers for the grid ──────────────────────────

    pub fn account_name(&self, id: i64) -> Option<&str> {
        self.account_by_id(id).map(|a| a.name.as_str())
    }

    pub fn category_name(&self, id: i64) -> Option<&str> {
        self.category_by_id(id).map(|c| c.name.as_str())
    }

    pub fn subcategory_name(&self, id: i64) -> Option<&str> {
        self.subcategory_by_id(id).map(|s| s.name.as_str())
    }
}
