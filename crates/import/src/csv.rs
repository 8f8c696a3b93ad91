use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::NewTransaction;
use std::io::Read;
use thiserror::Error;

use crate::dates::normalize_date;
use crate::normalize::TextNormalizer;
use crate::ImportSummary;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvColumnMapping {
    pub date_column: Option<usize>,
    pub description_column: Option<usize>,
    pub amount_column: Option<usize>,
    pub category_column: Option<usize>,
}

impl CsvColumnMapping {
    /// Picks likely columns by header name. Earlier columns win.
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> Self {
        let find = |pred: &dyn Fn(&str) -> bool| {
            headers
                .iter()
                .position(|h| pred(&h.as_ref().trim().to_lowercase()))
        };
        Self {
            date_column: find(&|h| h.contains("date") || h.contains("posted")),
            description_column: find(&|h| {
                h.contains("desc") || h.contains("memo") || h.contains("merchant") || h.contains("name")
            }),
            amount_column: find(&|h| h.contains("amount") || h.contains("debit") || h.contains("total")),
            category_column: find(&|h| h.contains("categ")),
        }
    }

    fn is_unset(&self) -> bool {
        self.date_column.is_none() && self.description_column.is_none() && self.amount_column.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvImportProfile {
    /// Account name stamped on every imported row.
    pub account: String,
    /// Left unset, columns are detected from the header row.
    pub mapping: CsvColumnMapping,
    pub has_header: bool,
    pub delimiter: String,
}

impl Default for CsvImportProfile {
    fn default() -> Self {
        Self {
            account: "CSV Import".to_string(),
            mapping: CsvColumnMapping::default(),
            has_header: true,
            delimiter: ",".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("No data rows")]
    NoDataRows,
}

struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    category: Option<usize>,
}

impl Columns {
    fn from_mapping(mapping: &CsvColumnMapping) -> Result<Self, CsvError> {
        Ok(Self {
            date: mapping.date_column.ok_or(CsvError::MissingColumn("date"))?,
            description: mapping
                .description_column
                .ok_or(CsvError::MissingColumn("description"))?,
            amount: mapping.amount_column.ok_or(CsvError::MissingColumn("amount"))?,
            category: mapping.category_column,
        })
    }
}

pub struct CsvImporter<'a> {
    rules: &'a CategoryRules,
    normalizer: &'a TextNormalizer,
}

impl Default for CsvImporter<'static> {
    fn default() -> Self {
        Self::new(CategoryRules::builtin())
    }
}

impl<'a> CsvImporter<'a> {
    pub fn new(rules: &'a CategoryRules) -> Self {
        Self {
            rules,
            normalizer: TextNormalizer::shared(),
        }
    }

    pub fn import<R: Read>(&self, data: R, profile: &CsvImportProfile) -> Result<ImportSummary, CsvError> {
        let delimiter = profile
            .delimiter
            .as_bytes()
            .first()
            .copied()
            .unwrap_or(b',');
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(profile.has_header)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(data);

        let mapping = if profile.mapping.is_unset() && profile.has_header {
            let headers = reader.headers()?.clone();
            CsvColumnMapping::detect(&headers.iter().collect::<Vec<_>>())
        } else {
            profile.mapping.clone()
        };
        let columns = Columns::from_mapping(&mapping)?;

        let mut summary = ImportSummary::default();
        let mut rows = 0usize;
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            rows += 1;
            match self.parse_row(&record, &columns, &profile.account) {
                Some(tx) => summary.transactions.push(tx),
                None => {
                    tracing::warn!(line = ?record.position().map(|p| p.line()), "skipping CSV row with bad date or amount");
                    summary.skipped += 1;
                }
            }
        }

        if rows == 0 {
            return Err(CsvError::NoDataRows);
        }
        tracing::info!(
            imported = summary.transactions.len(),
            skipped = summary.skipped,
            account = %profile.account,
            "CSV import finished"
        );
        Ok(summary)
    }

    fn parse_row(&self, record: &csv::StringRecord, columns: &Columns, account: &str) -> Option<NewTransaction> {
        let date = normalize_date(record.get(columns.date)?)?;
        let amount = Money::parse(record.get(columns.amount)?)?;
        let raw = record.get(columns.description).unwrap_or_default();

        let cleaned = self.normalizer.clean(raw);
        let given = columns
            .category
            .and_then(|col| record.get(col))
            .and_then(|s| s.trim().parse::<Category>().ok())
            .unwrap_or_else(|| self.rules.auto_category(&cleaned.cleaned));

        let mut tx = NewTransaction::new(date, cleaned.cleaned.clone(), amount);
        tx.category = self.rules.recategorize(&cleaned.cleaned, given);
        tx.original_description = cleaned.original;
        tx.merchant = cleaned.merchant;
        tx.transaction_type = cleaned.transaction_type;
        tx.account = account.to_string();
        Some(tx)
    }
}

pub fn import_csv<R: Read>(data: R, profile: &CsvImportProfile) -> Result<ImportSummary, CsvError> {
    CsvImporter::default().import(data, profile)
}
