pub mod ledger;
pub mod repository;
pub mod store;

use spendlens_core::transaction::LedgerError;
use thiserror::Error;

pub use ledger::{CategoryAssignment, Ledger, LedgerEvent};
pub use repository::{
    BudgetRepository, LookupCacheRepository, TransactionRepository, BUDGET_KEY, LOOKUP_CACHE_KEY,
    TRANSACTIONS_KEY,
};
pub use store::{create_db, DbPool, KeyValueStore, MemoryStore, SqliteStore};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
