use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::catalog::Catalog;
use crate::models::{Column, Transaction, TxnType};

/// Field-keyed validation messages for one row.
pub type FieldErrors = BTreeMap<Column, String>;

/// Validate a candidate row against the catalog. All violations are
/// collected; a rule is skipped only when it depends on an earlier one
/// holding (subcategory needs a resolved category). The input row is never
/// mutated; success returns a normalized copy with ids and names consistent
/// and the value quantized.
///
/// This function never creates sentinels. Catalog healing happens at load
/// time and inside edit cascades, not here.
pub fn validate(row: &Transaction, catalog: &Catalog) -> Result<Transaction, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut out = row.clone();

    let name = row.name.trim();
    if name.is_empty() {
        errors.insert(Column::Name, "name is required".to_string());
    } else {
        out.name = name.to_string();
    }

    let value = row.quantized_value();
    if value <= Decimal::ZERO {
        errors.insert(
            Column::Value,
            "value must be greater than zero".to_string(),
        );
    }
    out.value = value;

    // An invalid type still lets category validation proceed against
    // Expense, so the user sees the category problem too instead of a
    // cascade of empty failures.
    let txn_type = match TxnType::parse(&row.txn_type) {
        Some(t) => t,
        None => {
            errors.insert(
                Column::Type,
                format!("type must be Income or Expense, not '{}'", row.txn_type),
            );
            TxnType::Expense
        }
    };
    out.txn_type = txn_type.as_str().to_string();

    if NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").is_err() {
        errors.insert(
            Column::Date,
            format!("date must be YYYY-MM-DD, not '{}'", row.date),
        );
    } else {
        out.date = row.date.trim().to_string();
    }

    match resolve_account(row, catalog) {
        Ok((id, name)) => {
            out.account_id = Some(id);
            out.account = name;
        }
        Err(message) => {
            errors.insert(Column::Account, message);
        }
    }

    let category_id = match resolve_category(row, txn_type, catalog) {
        Ok((id, name)) => {
            out.category_id = Some(id);
            out.category = name;
            Some(id)
        }
        Err(message) => {
            errors.insert(Column::Category, message);
            None
        }
    };

    if let Some(category_id) = category_id {
        match resolve_subcategory(row, category_id, catalog) {
            Ok((id, name)) => {
                out.subcategory_id = Some(id);
                out.subcategory = name;
            }
            Err(message) => {
                errors.insert(Column::Subcategory, message);
            }
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

fn resolve_account(row: &Transaction, catalog: &Catalog) -> Result<(i64, String), String> {
    if let Some(id) = row.account_id {
        return match catalog.account_by_id(id) {
            Some(account) => Ok((id, account.name.clone())),
            None => Err(format!("no account with id {id}")),
        };
    }
    let name = row.account.trim();
    if name.is_empty() {
        return Err("account is required".to_string());
    }
    match catalog.account_by_name(name) {
        Some(account) => match account.id {
            Some(id) => Ok((id, account.name.clone())),
            None => Err(format!("account '{name}' has no id")),
        },
        None => Err(format!("unknown account '{name}'")),
    }
}

fn resolve_category(
    row: &Transaction,
    txn_type: TxnType,
    catalog: &Catalog,
) -> Result<(i64, String), String> {
    if let Some(id) = row.category_id {
        return match catalog.category_by_id(id) {
            Some(category) if category.txn_type == txn_type => Ok((id, category.name.clone())),
            Some(category) => Err(format!(
                "category '{}' is not a {txn_type} category",
                category.name
            )),
            None => Err(format!("no category with id {id}")),
        };
    }
    let name = row.category.trim();
    if name.is_empty() {
        return Err("category is required".to_string());
    }
    match catalog.category_by_name_and_type(name, txn_type) {
        Some(category) => match category.id {
            Some(id) => Ok((id, category.name.clone())),
            None => Err(format!("category '{name}' has no id")),
        },
        None => Err(format!("unknown {txn_type} category '{name}'")),
    }
}

fn resolve_subcategory(
    row: &Transaction,
    category_id: i64,
    catalog: &Catalog,
) -> Result<(i64, String), String> {
    if let Some(id) = row.subcategory_id {
        return match catalog.subcategory_by_id(id) {
            Some(sub) if sub.category_id == category_id => Ok((id, sub.name.clone())),
            Some(sub) => Err(format!(
                "subcategory '{}' does not belong to the selected category",
                sub.name
            )),
            None => Err(format!("no subcategory with id {id}")),
        };
    }
    let name = row.subcategory.trim();
    if name.is_empty() {
        return Err("subcategory is required".to_string());
    }
    match catalog.subcategory_by_name_in(name, category_id) {
        Some(sub) => match sub.id {
            Some(id) => Ok((id, sub.name.clone())),
            None => Err(format!("subcategory '{name}' has no id")),
        },
        None => Err(format!("unknown subcategory '{name}'")),
    }
}
