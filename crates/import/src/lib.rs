pub mod csv;
pub mod dates;
pub mod json;
pub mod manual;
pub mod merchants;
pub mod normalize;
pub mod pdf;

use spendlens_core::transaction::NewTransaction;
use thiserror::Error;

pub use self::csv::{import_csv, CsvColumnMapping, CsvError, CsvImportProfile, CsvImporter};
pub use json::{import_json, import_json_with_rules, JsonError};
pub use manual::{ManualEntry, MANUAL_ACCOUNT};
pub use merchants::MerchantTable;
pub use normalize::{CleanedDescription, TextNormalizer, UNKNOWN_TRANSACTION};
pub use pdf::{
    ExtractorChain, FlatTextExtractor, LayoutProfile, SpatialTableExtractor, StatementDocument,
    StatementExtractor, TextFragment,
};

/// Rows an importer produced plus the count it could not read.
#[derive(Debug, Default, Clone)]
pub struct ImportSummary {
    pub transactions: Vec<NewTransaction>,
    pub skipped: usize,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("No statement layout recognized in {0}")]
    UnrecognizedLayout(String),
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Json(#[from] JsonError),
}
