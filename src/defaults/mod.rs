use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::catalog::Catalog;
use crate::models::{Transaction, TxnType};

/// Last-used field values, persisted as a flat `key=value` file and used to
/// seed new pending rows. Lives outside the core engine; the engine only
/// consumes [`Defaults::apply_to`].
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    values: BTreeMap<String, String>,
}

impl Defaults {
    /// A missing file is an empty set of defaults, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read defaults file: {}", path.display()))?;
        let mut values = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Ok(Self { values })
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut text = String::new();
        for (key, value) in &self.values {
            text.push_str(key);
            text.push('=');
            text.push_str(value);
            text.push('\n');
        }
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write defaults file: {}", path.display()))
    }

    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("com", "ledgergrid", "ledgergrid")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(proj_dirs.data_dir().join("defaults.conf"))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Seed a fresh pending row. Names are resolved through the catalog;
    /// a stale name that no longer resolves is skipped rather than leaving
    /// the row pointing at a reference that no longer exists. An empty date
    /// becomes today.
    pub fn apply_to(&self, row: &mut Transaction, catalog: &Catalog) {
        if let Some(txn_type) = self.get("type").and_then(TxnType::parse) {
            row.txn_type = txn_type.as_str().to_string();
        }
        if let Some(account) = self.get("account").and_then(|n| catalog.account_by_name(n)) {
            row.account_id = account.id;
            row.account = account.name.clone();
        }
        let txn_type = TxnType::parse_or_expense(&row.txn_type);
        if let Some(category) = self
            .get("category")
            .and_then(|n| catalog.category_by_name_and_type(n, txn_type))
        {
            row.category_id = category.id;
            row.category = category.name.clone();
        }
        if let Some(category_id) = row.category_id {
            if let Some(sub) = self
                .get("subcategory")
                .and_then(|n| catalog.subcategory_by_name_in(n, category_id))
            {
                row.subcategory_id = sub.id;
                row.subcategory = sub.name.clone();
            }
        }
        if row.date.is_empty() {
            row.date = chrono::Local::now().format("%Y-%m-%d").to_string();
        }
    }
}

#[cfg(test)]
mod tests;
