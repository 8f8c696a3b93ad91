use serde_json::Value;
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::NewTransaction;
use thiserror::Error;

use crate::dates::normalize_date;
use crate::normalize::TextNormalizer;
use crate::ImportSummary;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Expected an array or object of transactions")]
    UnexpectedShape,
}

/// Imports pre-extracted transactions. `source_name` (a file name, with any
/// `.json` suffix dropped) is the account for items that name none.
pub fn import_json(data: &str, source_name: &str) -> Result<ImportSummary, JsonError> {
    import_json_with_rules(data, source_name, CategoryRules::builtin())
}

pub fn import_json_with_rules(
    data: &str,
    source_name: &str,
    rules: &CategoryRules,
) -> Result<ImportSummary, JsonError> {
    let value: Value = serde_json::from_str(data)?;
    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => return Err(JsonError::UnexpectedShape),
    };

    let default_account = strip_suffix_ci(source_name.trim(), ".json");
    let mut summary = ImportSummary::default();
    for item in &items {
        match parse_item(item, default_account, rules) {
            Some(tx) => summary.transactions.push(tx),
            None => summary.skipped += 1,
        }
    }
    if summary.skipped > 0 {
        tracing::warn!(skipped = summary.skipped, "JSON items without a usable date or amount");
    }
    tracing::info!(imported = summary.transactions.len(), source = source_name, "JSON import finished");
    Ok(summary)
}

fn parse_item(item: &Value, default_account: &str, rules: &CategoryRules) -> Option<NewTransaction> {
    let obj = item.as_object()?;
    let date = normalize_date(obj.get("date")?.as_str()?)?;
    let amount = match obj.get("amount")? {
        Value::Number(n) => Money::from_f64(n.as_f64()?)?,
        Value::String(s) => Money::parse(s)?,
        _ => return None,
    };
    let raw = obj
        .get("description")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Unknown");
    let is_income = obj
        .get("is_income")
        .or_else(|| obj.get("isIncome"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let cleaned = TextNormalizer::shared().clean(raw);
    let mut tx = NewTransaction::new(date, cleaned.cleaned.clone(), amount);
    tx.category = if is_income {
        Category::Income
    } else {
        rules.auto_category(&cleaned.cleaned)
    };
    tx.is_income = is_income;
    tx.original_description = cleaned.original;
    tx.merchant = cleaned.merchant;
    tx.transaction_type = cleaned.transaction_type;
    tx.account = obj
        .get("account")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_account)
        .to_string();
    tx.cardholder = obj
        .get("cardholder")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(tx)
}

pub(crate) fn strip_suffix_ci<'a>(name: &'a str, suffix: &str) -> &'a str {
    let split = name.len().saturating_sub(suffix.len());
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(tail)) if tail.eq_ignore_ascii_case(suffix) => stem,
        _ => name,
    }
}
