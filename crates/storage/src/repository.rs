use serde::de::DeserializeOwned;
use serde::Serialize;
use spendlens_classify::LookupCache;
use spendlens_core::budget::Budget;
use spendlens_core::transaction::Transaction;

use crate::store::KeyValueStore;
use crate::StorageError;

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const BUDGET_KEY: &str = "budget";
pub const LOOKUP_CACHE_KEY: &str = "lookup_cache";

/// Missing or unreadable records come back as `T::default()`.
async fn load_record<S, T>(store: &S, key: &str) -> Result<T, StorageError>
where
    S: KeyValueStore,
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored record is malformed, treating as empty");
            Ok(T::default())
        }
    }
}

async fn save_record<S, T>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key, &json).await
}

/// The full transaction set, stored as one JSON array.
pub struct TransactionRepository<'s, S> {
    store: &'s S,
}

impl<'s, S: KeyValueStore> TransactionRepository<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub async fn load_all(&self) -> Result<Vec<Transaction>, StorageError> {
        load_record(self.store, TRANSACTIONS_KEY).await
    }

    pub async fn save_all(&self, transactions: &[Transaction]) -> Result<(), StorageError> {
        save_record(self.store, TRANSACTIONS_KEY, transactions).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(TRANSACTIONS_KEY).await
    }
}

pub struct BudgetRepository<'s, S> {
    store: &'s S,
}

impl<'s, S: KeyValueStore> BudgetRepository<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<Budget, StorageError> {
        load_record(self.store, BUDGET_KEY).await
    }

    pub async fn save(&self, budget: &Budget) -> Result<(), StorageError> {
        save_record(self.store, BUDGET_KEY, budget).await
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(BUDGET_KEY).await
    }
}

pub struct LookupCacheRepository<'s, S> {
    store: &'s S,
}

impl<'s, S: KeyValueStore> LookupCacheRepository<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<LookupCache, StorageError> {
        load_record(self.store, LOOKUP_CACHE_KEY).await
    }

    pub async fn save(&self, cache: &LookupCache) -> Result<(), StorageError> {
        save_record(self.store, LOOKUP_CACHE_KEY, cache).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use spendlens_core::category::Category;
    use spendlens_core::money::Money;
    use spendlens_core::transaction::NewTransaction;

    fn sample() -> Transaction {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        Transaction::from_new(NewTransaction::new(date, "Starbucks", Money::from_cents(550)))
    }

    #[tokio::test]
    async fn transactions_round_trip() {
        let store = MemoryStore::new();
        let repo = TransactionRepository::new(&store);
        assert!(repo.load_all().await.unwrap().is_empty());

        let txs = vec![sample()];
        repo.save_all(&txs).await.unwrap();
        assert_eq!(repo.load_all().await.unwrap(), txs);

        repo.clear().await.unwrap();
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_records_read_as_empty() {
        let store = MemoryStore::new();
        store.set(TRANSACTIONS_KEY, "{not json").await.unwrap();
        store.set(BUDGET_KEY, "[1, 2]").await.unwrap();
        assert!(TransactionRepository::new(&store).load_all().await.unwrap().is_empty());
        assert!(BudgetRepository::new(&store).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn budget_and_cache_use_their_own_keys() {
        let store = MemoryStore::new();
        let mut budget = Budget::default();
        budget.set_target(Category::Dining, Money::from_cents(20000));
        BudgetRepository::new(&store).save(&budget).await.unwrap();
        LookupCacheRepository::new(&store).save(&LookupCache::default()).await.unwrap();

        assert_eq!(BudgetRepository::new(&store).load().await.unwrap(), budget);
        assert_eq!(store.get(LOOKUP_CACHE_KEY).await.unwrap().as_deref(), Some("{}"));
        assert_eq!(store.get(TRANSACTIONS_KEY).await.unwrap(), None);
    }
}
