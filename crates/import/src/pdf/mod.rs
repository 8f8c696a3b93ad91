//! Statement extraction from positioned PDF text fragments.
//!
//! Fragments come from whatever PDF text layer the caller uses; each carries
//! its page number and baseline position (Y grows upward, as in PDF user
//! space). Strategies are tried in order by [`ExtractorChain`].

pub mod flat_text;
pub mod spatial;

use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::NewTransaction;
use chrono::NaiveDate;

use crate::json::strip_suffix_ci;
use crate::normalize::TextNormalizer;
use crate::ImportError;

pub use flat_text::FlatTextExtractor;
pub use spatial::{LayoutProfile, SpatialTableExtractor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl TextFragment {
    pub fn new(page: u32, x: f64, y: f64, text: impl Into<String>) -> Self {
        Self { page, x, y, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementDocument {
    /// File name; doubles as the account name.
    pub source_name: String,
    /// Year for statements whose dates omit it and whose header names no period.
    pub fallback_year: i32,
    pub fragments: Vec<TextFragment>,
}

impl StatementDocument {
    /// Drops blank fragments and trims the rest.
    pub fn new(source_name: impl Into<String>, fallback_year: i32, fragments: Vec<TextFragment>) -> Self {
        let fragments = fragments
            .into_iter()
            .filter_map(|f| {
                let text = f.text.trim();
                (!text.is_empty()).then(|| TextFragment { text: text.to_string(), ..f })
            })
            .collect();
        Self {
            source_name: source_name.into(),
            fallback_year,
            fragments,
        }
    }

    pub fn account_name(&self) -> &str {
        strip_suffix_ci(self.source_name.trim(), ".pdf")
    }

    pub fn full_text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One way of reading a statement layout. An empty result means the layout
/// was not recognized.
pub trait StatementExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, doc: &StatementDocument, rules: &CategoryRules) -> Vec<NewTransaction>;
}

/// A recognized statement row before normalization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub is_income: bool,
    pub cardholder: Option<String>,
}

impl RawRow {
    pub(crate) fn into_new_transaction(self, account: &str, rules: &CategoryRules) -> NewTransaction {
        let cleaned = TextNormalizer::shared().clean(&self.description);
        let mut tx = NewTransaction::new(self.date, cleaned.cleaned.clone(), self.amount);
        tx.category = if self.is_income {
            Category::Income
        } else {
            rules.auto_category(&cleaned.cleaned)
        };
        tx.is_income = self.is_income;
        tx.original_description = cleaned.original;
        tx.merchant = cleaned.merchant;
        tx.transaction_type = cleaned.transaction_type;
        tx.account = account.to_string();
        tx.cardholder = self.cardholder;
        tx
    }
}

pub struct ExtractorChain {
    extractors: Vec<Box<dyn StatementExtractor>>,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SpatialTableExtractor::new(LayoutProfile::sectioned_card())),
            Box::new(SpatialTableExtractor::new(LayoutProfile::ledger())),
            Box::new(FlatTextExtractor),
        ])
    }
}

impl ExtractorChain {
    pub fn new(extractors: Vec<Box<dyn StatementExtractor>>) -> Self {
        Self { extractors }
    }

    /// First strategy with a non-empty result wins.
    pub fn extract(
        &self,
        doc: &StatementDocument,
        rules: &CategoryRules,
    ) -> Result<Vec<NewTransaction>, ImportError> {
        for extractor in &self.extractors {
            let txs = extractor.extract(doc, rules);
            tracing::debug!(
                strategy = extractor.name(),
                found = txs.len(),
                source = %doc.source_name,
                "statement strategy finished"
            );
            if !txs.is_empty() {
                tracing::info!(
                    strategy = extractor.name(),
                    imported = txs.len(),
                    source = %doc.source_name,
                    "statement import finished"
                );
                return Ok(txs);
            }
        }
        Err(ImportError::UnrecognizedLayout(doc.source_name.clone()))
    }
}

/// Rounds to the nearest multiple of `step`.
pub(crate) fn round_to(value: f64, step: f64) -> i64 {
    ((value / step).round() * step) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, usize);

    impl StatementExtractor for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn extract(&self, _doc: &StatementDocument, _rules: &CategoryRules) -> Vec<NewTransaction> {
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            (0..self.1)
                .map(|_| NewTransaction::new(date, self.0, Money::from_cents(100)))
                .collect()
        }
    }

    fn doc() -> StatementDocument {
        StatementDocument::new("Statement.PDF", 2024, vec![TextFragment::new(1, 0.0, 0.0, "  ")])
    }

    #[test]
    fn document_trims_and_names_account() {
        let d = doc();
        assert!(d.fragments.is_empty());
        assert_eq!(d.account_name(), "Statement");
    }

    #[test]
    fn chain_takes_first_non_empty() {
        let chain = ExtractorChain::new(vec![
            Box::new(Fixed("a", 0)),
            Box::new(Fixed("b", 2)),
            Box::new(Fixed("c", 5)),
        ]);
        let txs = chain.extract(&doc(), CategoryRules::builtin()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].description, "b");
    }

    #[test]
    fn chain_all_empty_is_unrecognized() {
        let chain = ExtractorChain::default();
        let err = chain.extract(&doc(), CategoryRules::builtin()).unwrap_err();
        assert!(matches!(err, ImportError::UnrecognizedLayout(name) if name == "Statement.PDF"));
    }

    #[test]
    fn round_to_step() {
        assert_eq!(round_to(487.0, 10.0), 490);
        assert_eq!(round_to(72.4, 1.0), 72);
    }
}
