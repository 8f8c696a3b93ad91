use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::NewTransaction;

use crate::normalize::TextNormalizer;

pub const MANUAL_ACCOUNT: &str = "Manual";

/// A hand-entered transaction as submitted from a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub cardholder: Option<String>,
    #[serde(default)]
    pub is_income: bool,
}

impl ManualEntry {
    pub fn into_new_transaction(self, rules: &CategoryRules) -> NewTransaction {
        let cleaned = TextNormalizer::shared().clean(&self.description);
        let category = match self.category {
            Some(c) => c,
            None if self.is_income => Category::Income,
            None => rules.auto_category(&cleaned.cleaned),
        };
        let mut tx = NewTransaction::new(self.date, cleaned.cleaned, self.amount);
        tx.category = category;
        tx.original_description = cleaned.original;
        tx.merchant = cleaned.merchant;
        tx.transaction_type = cleaned.transaction_type;
        tx.account = self
            .account
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| MANUAL_ACCOUNT.to_string());
        tx.cardholder = self.cardholder;
        tx.is_income = self.is_income;
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(description: &str, cents: i64) -> ManualEntry {
        ManualEntry {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            description: description.to_string(),
            amount: Money::from_cents(cents),
            category: None,
            account: None,
            cardholder: None,
            is_income: false,
        }
    }

    #[test]
    fn defaults_account_and_auto_categorizes() {
        let tx = entry("NETFLIX.COM", -1599).into_new_transaction(CategoryRules::builtin());
        assert_eq!(tx.account, MANUAL_ACCOUNT);
        assert_eq!(tx.amount.to_cents(), 1599);
        assert_eq!(tx.description, "Netflix");
        assert_eq!(tx.category, Category::Entertainment);
    }

    #[test]
    fn explicit_category_wins() {
        let mut e = entry("NETFLIX.COM", 1599);
        e.category = Some(Category::Subscriptions);
        e.account = Some("Visa".to_string());
        let tx = e.into_new_transaction(CategoryRules::builtin());
        assert_eq!(tx.category, Category::Subscriptions);
        assert_eq!(tx.account, "Visa");
    }

    #[test]
    fn income_flag_sets_income() {
        let mut e = entry("Acme Corp", 250000);
        e.is_income = true;
        let tx = e.into_new_transaction(CategoryRules::builtin());
        assert_eq!(tx.category, Category::Income);
        assert!(tx.is_income);
    }
}
