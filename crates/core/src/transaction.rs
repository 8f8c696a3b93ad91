use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::{Category, TransactionType};
use crate::money::Money;
use crate::period::{DateRange, Month};

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("A transaction cannot be paired with itself: {0}")]
    SelfTransfer(String),
    #[error("Transaction {0} is already part of a transfer pair")]
    AlreadyPaired(String),
    #[error("Transfer pair not found: {0}")]
    TransferPairNotFound(String),
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Raw statement text as ingested. Never rewritten.
    #[serde(default)]
    pub original_description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "unknown")]
    pub account: String,
    #[serde(default = "unknown")]
    pub cardholder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub manual_override: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_pair_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_income: bool,
}

impl Transaction {
    pub fn from_new(new: NewTransaction) -> Self {
        let description = match new.description.trim() {
            "" => "Unknown Transaction".to_string(),
            d => d.to_string(),
        };
        let original_description = if new.original_description.trim().is_empty() {
            description.clone()
        } else {
            new.original_description
        };
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            date: new.date,
            description,
            original_description,
            amount: new.amount.abs(),
            category: new.category,
            account: non_blank_or_unknown(new.account),
            cardholder: non_blank_or_unknown(new.cardholder.unwrap_or_default()),
            merchant: new.merchant.filter(|m| !m.trim().is_empty()),
            transaction_type: new.transaction_type,
            manual_override: false,
            transfer_pair_id: None,
            is_income: new.is_income,
        }
    }

    /// Money flowing in: categorized `Income` or flagged at ingestion.
    pub fn is_income(&self) -> bool {
        self.category == Category::Income || self.is_income
    }

    /// Outflow that counts toward spending (not income, not a transfer).
    pub fn is_expense(&self) -> bool {
        !self.is_income() && self.category != Category::Transfer
    }

    pub fn month(&self) -> Month {
        Month::of(self.date)
    }

    /// Original statement text, falling back to the display description.
    pub fn source_text(&self) -> &str {
        if self.original_description.trim().is_empty() {
            &self.description
        } else {
            &self.original_description
        }
    }

    pub fn apply_patch(&mut self, patch: TransactionPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(description) = patch.description {
            let trimmed = description.trim();
            if !trimmed.is_empty() {
                self.description = trimmed.to_string();
            }
        }
        if let Some(amount) = patch.amount {
            self.amount = amount.abs();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(account) = patch.account {
            self.account = non_blank_or_unknown(account);
        }
        if let Some(cardholder) = patch.cardholder {
            self.cardholder = non_blank_or_unknown(cardholder);
        }
        if let Some(flag) = patch.manual_override {
            self.manual_override = flag;
        }
    }
}

fn non_blank_or_unknown(s: String) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        unknown()
    } else {
        trimmed.to_string()
    }
}

/// Normalized record produced by every importer, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub original_description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "unknown")]
    pub account: String,
    #[serde(default)]
    pub cardholder: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub is_income: bool,
}

impl NewTransaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Money) -> Self {
        let description = description.into();
        NewTransaction {
            date,
            original_description: description.clone(),
            description,
            amount: amount.abs(),
            category: Category::Other,
            account: unknown(),
            cardholder: None,
            merchant: None,
            transaction_type: None,
            is_income: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub category: Option<Category>,
    pub account: Option<String>,
    pub cardholder: Option<String>,
    pub manual_override: Option<bool>,
}

/// Conjunctive filter over the transaction set. Empty fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub account: Option<String>,
    pub cardholder: Option<String>,
    pub category: Option<Category>,
    pub month: Option<Month>,
    pub range: Option<DateRange>,
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.account.as_deref().is_some_and(|a| a != tx.account) {
            return false;
        }
        if self.cardholder.as_deref().is_some_and(|c| c != tx.cardholder) {
            return false;
        }
        if self.category.is_some_and(|c| c != tx.category) {
            return false;
        }
        if self.month.is_some_and(|m| !m.contains(tx.date)) {
            return false;
        }
        if self.range.is_some_and(|r| !r.contains(tx.date)) {
            return false;
        }
        if let Some(query) = self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = query.to_lowercase();
            let hit = tx.description.to_lowercase().contains(&q)
                || tx.original_description.to_lowercase().contains(&q)
                || tx
                    .merchant
                    .as_deref()
                    .is_some_and(|m| m.to_lowercase().contains(&q));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Transaction {
        let mut new = NewTransaction::new(date(2024, 3, 1), "Starbucks", Money::from_cents(-550));
        new.original_description = "POS DEBIT STARBUCKS #123".to_string();
        new.account = "Checking".to_string();
        new.merchant = Some("Starbucks".to_string());
        Transaction::from_new(new)
    }

    #[test]
    fn from_new_assigns_id_and_magnitude() {
        let tx = sample();
        assert!(!tx.id.is_empty());
        assert_eq!(tx.amount.to_cents(), 550);
        assert_eq!(tx.cardholder, UNKNOWN);
        assert_eq!(tx.category, Category::Other);
    }

    #[test]
    fn from_new_fills_blank_fields() {
        let mut new = NewTransaction::new(date(2024, 3, 1), "  ", Money::from_cents(100));
        new.account = " ".to_string();
        let tx = Transaction::from_new(new);
        assert_eq!(tx.description, "Unknown Transaction");
        assert_eq!(tx.original_description, "Unknown Transaction");
        assert_eq!(tx.account, UNKNOWN);
    }

    #[test]
    fn patch_keeps_amount_non_negative() {
        let mut tx = sample();
        tx.apply_patch(TransactionPatch {
            amount: Some(Money::from_cents(-1200)),
            category: Some(Category::Dining),
            ..Default::default()
        });
        assert_eq!(tx.amount.to_cents(), 1200);
        assert_eq!(tx.category, Category::Dining);
        assert_eq!(tx.original_description, "POS DEBIT STARBUCKS #123");
    }

    #[test]
    fn income_flag_or_category_marks_income() {
        let mut tx = sample();
        assert!(tx.is_expense());
        tx.is_income = true;
        assert!(tx.is_income());
        tx.is_income = false;
        tx.category = Category::Income;
        assert!(tx.is_income());
        tx.category = Category::Transfer;
        assert!(!tx.is_expense());
    }

    #[test]
    fn serde_uses_camel_case_and_skips_defaults() {
        let tx = sample();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["originalDescription"], "POS DEBIT STARBUCKS #123");
        assert_eq!(json["amount"], 5.5);
        assert!(json.get("manualOverride").is_none());
        assert!(json.get("transferPairId").is_none());
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn filter_search_covers_original_and_merchant() {
        let tx = sample();
        let by_raw = TransactionFilter {
            search: Some("pos debit".to_string()),
            ..Default::default()
        };
        assert!(by_raw.matches(&tx));
        let wrong_account = TransactionFilter {
            account: Some("Savings".to_string()),
            ..Default::default()
        };
        assert!(!wrong_account.matches(&tx));
        let month = TransactionFilter {
            month: Month::new(2024, 3),
            ..Default::default()
        };
        assert!(month.matches(&tx));
    }
}
