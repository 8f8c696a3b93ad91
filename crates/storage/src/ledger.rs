//! The transaction set as a service: every mutation loads the full set,
//! applies the change, saves once and notifies subscribers.

use rust_decimal::Decimal;
use serde::Serialize;
use spendlens_classify::{
    self as classify, BusinessLookup, Classification, Classifier, ConfirmedTransfer, LookupOutcome,
    SearchSummary, SignalWeights, TransactionContext, TransferDetector, TransferPair,
    VendorApplySummary, VendorGroup, VendorSiblings,
};
use spendlens_core::analysis::{self, category_breakdown};
use spendlens_core::budget::Budget;
use spendlens_core::category::Category;
use spendlens_core::period::Month;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::{
    LedgerError, NewTransaction, Transaction, TransactionFilter, TransactionPatch,
};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::repository::{BudgetRepository, LookupCacheRepository, TransactionRepository};
use crate::store::KeyValueStore;
use crate::StorageError;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// The stored transaction set changed; `count` records were touched.
    TransactionsUpdated { count: usize },
    BudgetUpdated,
    Cleared,
}

/// Outcome of a manual category assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAssignment {
    pub transaction: Transaction,
    /// Same-vendor transactions still `Other`, offered for propagation.
    pub siblings: Option<VendorSiblings>,
}

pub struct Ledger<S> {
    store: S,
    rules: CategoryRules,
    weights: SignalWeights,
    transfers: TransferDetector,
    events: broadcast::Sender<LedgerEvent>,
}

impl<S: KeyValueStore> Ledger<S> {
    pub fn new(store: S, rules: CategoryRules) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            rules,
            weights: SignalWeights::default(),
            transfers: TransferDetector::default(),
            events,
        }
    }

    pub fn with_weights(mut self, weights: SignalWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_transfer_detector(mut self, detector: TransferDetector) -> Self {
        self.transfers = detector;
        self
    }

    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: LedgerEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn repo(&self) -> TransactionRepository<'_, S> {
        TransactionRepository::new(&self.store)
    }

    async fn save(&self, txs: &[Transaction], count: usize) -> Result<(), StorageError> {
        self.repo().save_all(txs).await?;
        self.publish(LedgerEvent::TransactionsUpdated { count });
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub async fn transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        self.repo().load_all().await
    }

    pub async fn filter(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StorageError> {
        let mut txs = self.transactions().await?;
        txs.retain(|t| filter.matches(t));
        Ok(txs)
    }

    /// Distinct account names, sorted.
    pub async fn accounts(&self) -> Result<Vec<String>, StorageError> {
        let mut accounts: Vec<String> = self
            .transactions()
            .await?
            .into_iter()
            .map(|t| t.account)
            .collect();
        accounts.sort();
        accounts.dedup();
        Ok(accounts)
    }

    pub async fn months(&self) -> Result<Vec<Month>, StorageError> {
        Ok(analysis::months(&self.transactions().await?))
    }

    // ── Single-record mutations ──────────────────────────────────────────────

    /// Assigns an id and fills in a keyword category where none was given.
    fn prepare(&self, mut new: NewTransaction) -> Transaction {
        new.category = self.rules.recategorize(&new.description, new.category);
        Transaction::from_new(new)
    }

    pub async fn add(&self, new: NewTransaction) -> Result<Transaction, StorageError> {
        let tx = self.prepare(new);
        let mut txs = self.transactions().await?;
        txs.push(tx.clone());
        self.save(&txs, 1).await?;
        Ok(tx)
    }

    pub async fn add_many(&self, new: Vec<NewTransaction>) -> Result<Vec<Transaction>, StorageError> {
        if new.is_empty() {
            return Ok(Vec::new());
        }
        let added: Vec<Transaction> = new.into_iter().map(|n| self.prepare(n)).collect();

        let mut txs = self.transactions().await?;
        txs.extend(added.iter().cloned());
        self.save(&txs, added.len()).await?;
        tracing::info!(added = added.len(), total = txs.len(), "transactions added");
        Ok(added)
    }

    pub async fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, StorageError> {
        let mut txs = self.transactions().await?;
        let tx = txs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
        let broken_link = match (&tx.transfer_pair_id, patch.category) {
            (Some(link), Some(category)) if category != Category::Transfer => Some(link.clone()),
            _ => None,
        };
        tx.apply_patch(patch);
        let mut count = 1;
        if let Some(link) = broken_link {
            count += self.release_pair(&mut txs, &link, id);
        }
        let updated = txs
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
        self.save(&txs, count).await?;
        Ok(updated)
    }

    /// Unlinks every member of `link` except `keep`. Released members go
    /// back to their keyword category; `keep` only loses the link.
    fn release_pair(&self, txs: &mut [Transaction], link: &str, keep: &str) -> usize {
        let mut released = 0;
        for t in txs
            .iter_mut()
            .filter(|t| t.transfer_pair_id.as_deref() == Some(link))
        {
            t.transfer_pair_id = None;
            if t.id != keep {
                t.category = self.rules.auto_category(&t.description);
                released += 1;
            }
        }
        if released > 0 {
            tracing::info!(link, released, "transfer pair dissolved");
        }
        released
    }

    /// A person's choice: the category sticks and automated passes skip it.
    pub async fn assign_category(&self, id: &str, category: Category) -> Result<CategoryAssignment, StorageError> {
        let patch = TransactionPatch {
            category: Some(category),
            manual_override: Some(true),
            ..TransactionPatch::default()
        };
        let transaction = self.update(id, patch).await?;
        let siblings = classify::find_vendor_siblings(&self.transactions().await?, id);
        Ok(CategoryAssignment { transaction, siblings })
    }

    pub async fn remove(&self, id: &str) -> Result<(), StorageError> {
        let mut txs = self.transactions().await?;
        let index = txs
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
        let removed = txs.remove(index);
        let mut count = 1;
        if let Some(link) = removed.transfer_pair_id.as_deref() {
            count += self.release_pair(&mut txs, link, id);
        }
        self.save(&txs, count).await
    }

    /// Drops the transaction set and the budget. The lookup cache survives.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.repo().clear().await?;
        BudgetRepository::new(&self.store).clear().await?;
        self.publish(LedgerEvent::Cleared);
        tracing::info!("ledger cleared");
        Ok(())
    }

    // ── Classification ───────────────────────────────────────────────────────

    pub async fn reclassify_all(&self) -> Result<usize, StorageError> {
        let mut txs = self.transactions().await?;
        let count = classify::reclassify_all(&self.rules, &mut txs);
        if count > 0 {
            self.save(&txs, count).await?;
        }
        Ok(count)
    }

    pub async fn analyze_unclassified(&self) -> Result<Vec<Classification>, StorageError> {
        let txs = self.transactions().await?;
        let classifier = Classifier::new(&self.rules, self.weights);
        Ok(classify::analyze_unclassified(&classifier, &txs))
    }

    pub async fn transaction_context(&self, id: &str) -> Result<TransactionContext, StorageError> {
        let txs = self.transactions().await?;
        let tx = txs
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
        Ok(classify::transaction_context(tx, &txs))
    }

    // ── Vendors ──────────────────────────────────────────────────────────────

    pub async fn actionable_vendor_groups(&self) -> Result<Vec<VendorGroup>, StorageError> {
        Ok(classify::actionable_vendor_groups(&self.transactions().await?))
    }

    pub async fn apply_vendor_category(&self, vendor_key: &str, category: Category) -> Result<usize, StorageError> {
        let mut txs = self.transactions().await?;
        let count = classify::apply_vendor_category(&mut txs, vendor_key, category);
        if count > 0 {
            self.save(&txs, count).await?;
        }
        Ok(count)
    }

    pub async fn apply_all_vendor_categories(&self) -> Result<VendorApplySummary, StorageError> {
        let mut txs = self.transactions().await?;
        let summary = classify::apply_all_vendor_categories(&mut txs);
        if summary.total_updated > 0 {
            self.save(&txs, summary.total_updated).await?;
        }
        Ok(summary)
    }

    pub async fn find_vendor_siblings(&self, id: &str) -> Result<Option<VendorSiblings>, StorageError> {
        Ok(classify::find_vendor_siblings(&self.transactions().await?, id))
    }

    // ── Transfers ────────────────────────────────────────────────────────────

    pub async fn detect_transfer_pairs(&self) -> Result<Vec<TransferPair>, StorageError> {
        Ok(self.transfers.detect(&self.transactions().await?))
    }

    pub async fn mark_transfer_pair(&self, id1: &str, id2: &str) -> Result<String, StorageError> {
        let mut txs = self.transactions().await?;
        let link = classify::mark_transfer_pair(&mut txs, id1, id2)?;
        self.save(&txs, 2).await?;
        Ok(link)
    }

    pub async fn unmark_transfer_pair(&self, link_id: &str) -> Result<usize, StorageError> {
        let mut txs = self.transactions().await?;
        let count = classify::unmark_transfer_pair(&mut txs, link_id, &self.rules)?;
        self.save(&txs, count).await?;
        Ok(count)
    }

    pub async fn confirmed_transfers(&self) -> Result<Vec<ConfirmedTransfer>, StorageError> {
        Ok(classify::confirmed_transfers(&self.transactions().await?))
    }

    // ── Budget ───────────────────────────────────────────────────────────────

    pub async fn budget(&self) -> Result<Budget, StorageError> {
        BudgetRepository::new(&self.store).load().await
    }

    pub async fn save_budget(&self, budget: &Budget) -> Result<(), StorageError> {
        BudgetRepository::new(&self.store).save(budget).await?;
        self.publish(LedgerEvent::BudgetUpdated);
        Ok(())
    }

    /// Replaces the budget with targets `reduction_percent` below the monthly
    /// average of each spending category.
    pub async fn auto_generate_budget(&self, reduction_percent: Decimal) -> Result<Budget, StorageError> {
        let breakdown = category_breakdown(&self.transactions().await?);
        let budget = Budget::auto_generate(&breakdown, reduction_percent);
        self.save_budget(&budget).await?;
        Ok(budget)
    }

    // ── Lookups ──────────────────────────────────────────────────────────────

    pub async fn auto_search_and_classify<L, F>(
        &self,
        lookup: &L,
        delay: Duration,
        progress: F,
    ) -> Result<SearchSummary, StorageError>
    where
        L: BusinessLookup,
        F: FnMut(usize, usize, &str),
    {
        let cache_repo = LookupCacheRepository::new(&self.store);
        let mut cache = cache_repo.load().await?;
        let cached_before = cache.len();
        let mut txs = self.transactions().await?;

        let summary =
            classify::auto_search_and_classify(&mut txs, lookup, &mut cache, &self.rules, delay, progress).await;

        if cache.len() != cached_before {
            cache_repo.save(&cache).await?;
        }
        if summary.classified > 0 {
            self.save(&txs, summary.classified).await?;
        }
        Ok(summary)
    }

    pub async fn search_for_context<L: BusinessLookup>(&self, id: &str, lookup: &L) -> Result<LookupOutcome, StorageError> {
        let txs = self.transactions().await?;
        let tx = txs
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
        let cache_repo = LookupCacheRepository::new(&self.store);
        let mut cache = cache_repo.load().await?;
        let cached_before = cache.len();
        let outcome = classify::search_for_context(tx, lookup, &mut cache).await;
        if cache.len() != cached_before {
            cache_repo.save(&cache).await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};
    use chrono::NaiveDate;
    use spendlens_classify::MockLookup;
    use spendlens_core::money::Money;
    use spendlens_core::rules::RuleOverrides;

    fn ledger() -> Ledger<MemoryStore> {
        let rules = CategoryRules::with_overrides(RuleOverrides::default()).unwrap();
        Ledger::new(MemoryStore::new(), rules)
    }

    fn new_tx((y, m, d): (i32, u32, u32), desc: &str, cents: i64, account: &str) -> NewTransaction {
        let mut n = NewTransaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), desc, Money::from_cents(cents));
        n.account = account.to_string();
        n
    }

    fn income((y, m, d): (i32, u32, u32), desc: &str, cents: i64, account: &str) -> NewTransaction {
        let mut n = new_tx((y, m, d), desc, cents, account);
        n.category = Category::Income;
        n
    }

    // ── records ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn add_categorizes_and_publishes() {
        let ledger = ledger();
        let mut events = ledger.subscribe();

        let added = ledger
            .add_many(vec![
                new_tx((2024, 3, 1), "Netflix", 1599, "Card"),
                new_tx((2024, 4, 2), "Zqx Holdings", -2500, "Checking"),
            ])
            .await
            .unwrap();

        assert_eq!(added[0].category, Category::Entertainment);
        assert_eq!(added[1].category, Category::Other);
        assert_eq!(added[1].amount, Money::from_cents(2500));
        assert_eq!(events.recv().await.unwrap(), LedgerEvent::TransactionsUpdated { count: 2 });
        assert_eq!(ledger.accounts().await.unwrap(), vec!["Card", "Checking"]);
        assert_eq!(ledger.months().await.unwrap().len(), 2);

        let filter = TransactionFilter {
            search: Some("netf".to_string()),
            ..TransactionFilter::default()
        };
        assert_eq!(ledger.filter(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn adding_nothing_saves_nothing() {
        let ledger = ledger();
        let mut events = ledger.subscribe();
        assert!(ledger.add_many(Vec::new()).await.unwrap().is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn update_and_remove() {
        let ledger = ledger();
        let tx = ledger.add(new_tx((2024, 3, 1), "Zqx Holdings", 1000, "Card")).await.unwrap();

        let patch = TransactionPatch {
            amount: Some(Money::from_cents(-1200)),
            ..TransactionPatch::default()
        };
        let updated = ledger.update(&tx.id, patch).await.unwrap();
        assert_eq!(updated.amount, Money::from_cents(1200));

        ledger.remove(&tx.id).await.unwrap();
        assert!(ledger.transactions().await.unwrap().is_empty());
        assert!(matches!(
            ledger.remove(&tx.id).await,
            Err(StorageError::Ledger(LedgerError::TransactionNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn assign_category_pins_and_offers_siblings() {
        let ledger = ledger();
        let added = ledger
            .add_many(vec![
                new_tx((2024, 3, 1), "Shell Oil #1234", 4000, "Card"),
                new_tx((2024, 3, 8), "Zqx Holdings", 3800, "Card"),
                new_tx((2024, 3, 9), "ZQX HOLDINGS #77", 3800, "Card"),
            ])
            .await
            .unwrap();

        let assignment = ledger.assign_category(&added[1].id, Category::Shopping).await.unwrap();
        assert!(assignment.transaction.manual_override);
        assert_eq!(assignment.transaction.category, Category::Shopping);
        let siblings = assignment.siblings.unwrap();
        assert_eq!(siblings.siblings.len(), 1);
        assert_eq!(siblings.siblings[0].id, added[2].id);

        assert_eq!(ledger.apply_vendor_category(&siblings.vendor_key, Category::Shopping).await.unwrap(), 1);
        assert!(ledger
            .transactions()
            .await
            .unwrap()
            .iter()
            .all(|t| t.category != Category::Other));
    }

    // ── batches ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn reclassify_saves_only_on_change() {
        let ledger = ledger();
        ledger.add(new_tx((2024, 3, 1), "Zqx Holdings", 1000, "Card")).await.unwrap();
        let mut events = ledger.subscribe();
        assert_eq!(ledger.reclassify_all().await.unwrap(), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn transfer_lifecycle() {
        let ledger = ledger();
        ledger
            .add_many(vec![
                new_tx((2024, 3, 1), "Card Pmt", 4200, "Checking"),
                income((2024, 3, 2), "Thank You", 4200, "CreditCard"),
            ])
            .await
            .unwrap();

        let pairs = ledger.detect_transfer_pairs().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].confidence >= 65);

        let link = ledger.mark_transfer_pair(&pairs[0].tx1.id, &pairs[0].tx2.id).await.unwrap();
        assert!(ledger.detect_transfer_pairs().await.unwrap().is_empty());
        assert_eq!(ledger.confirmed_transfers().await.unwrap().len(), 1);

        assert_eq!(ledger.unmark_transfer_pair(&link).await.unwrap(), 2);
        assert!(ledger.confirmed_transfers().await.unwrap().is_empty());
        assert!(matches!(
            ledger.unmark_transfer_pair(&link).await,
            Err(StorageError::Ledger(LedgerError::TransferPairNotFound(_)))
        ));
    }

    async fn marked_pair(ledger: &Ledger<MemoryStore>) -> (String, String, String) {
        let added = ledger
            .add_many(vec![
                new_tx((2024, 3, 1), "Transfer to savings", 50000, "Checking"),
                income((2024, 3, 1), "Transfer from checking", 50000, "Savings"),
            ])
            .await
            .unwrap();
        let link = ledger.mark_transfer_pair(&added[0].id, &added[1].id).await.unwrap();
        (added[0].id.clone(), added[1].id.clone(), link)
    }

    #[tokio::test]
    async fn removing_a_paired_member_unlinks_the_other() {
        let ledger = ledger();
        let (out, inflow, _) = marked_pair(&ledger).await;

        ledger.remove(&out).await.unwrap();

        let txs = ledger.transactions().await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id, inflow);
        assert!(txs[0].transfer_pair_id.is_none());
        assert_eq!(txs[0].category, ledger.rules().auto_category("Transfer from checking"));
        assert!(ledger.confirmed_transfers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recategorizing_a_paired_member_dissolves_the_pair() {
        let ledger = ledger();
        let (out, inflow, _) = marked_pair(&ledger).await;

        let assigned = ledger.assign_category(&out, Category::Shopping).await.unwrap();
        assert_eq!(assigned.transaction.category, Category::Shopping);
        assert!(assigned.transaction.transfer_pair_id.is_none());

        let txs = ledger.transactions().await.unwrap();
        let other = txs.iter().find(|t| t.id == inflow).unwrap();
        assert!(other.transfer_pair_id.is_none());
        assert_eq!(other.category, ledger.rules().auto_category("Transfer from checking"));
        assert!(ledger.confirmed_transfers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_category_edits_keep_the_pair() {
        let ledger = ledger();
        let (out, inflow, link) = marked_pair(&ledger).await;

        let patch = TransactionPatch {
            description: Some("Savings sweep".to_string()),
            category: Some(Category::Transfer),
            ..TransactionPatch::default()
        };
        let updated = ledger.update(&out, patch).await.unwrap();
        assert_eq!(updated.transfer_pair_id.as_deref(), Some(link.as_str()));

        let confirmed = ledger.confirmed_transfers().await.unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].tx2.id, inflow);
        assert_eq!(ledger.unmark_transfer_pair(&link).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn budget_generation_and_clear() {
        let ledger = ledger();
        ledger
            .add_many(vec![
                new_tx((2024, 3, 1), "Netflix", 2000, "Card"),
                new_tx((2024, 4, 1), "Netflix", 2000, "Card"),
            ])
            .await
            .unwrap();

        let budget = ledger.auto_generate_budget(Decimal::TEN).await.unwrap();
        let entry = budget.get(Category::Entertainment).unwrap();
        assert_eq!(entry.target, Money::from_cents(1800));
        assert_eq!(ledger.budget().await.unwrap(), budget);

        let mut events = ledger.subscribe();
        ledger.clear_all().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), LedgerEvent::Cleared);
        assert!(ledger.transactions().await.unwrap().is_empty());
        assert!(ledger.budget().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn auto_search_persists_cache_and_categories() {
        let ledger = ledger();
        let mut n = new_tx((2024, 3, 1), "Blue Door", 1800, "Card");
        n.original_description = "BLUE DOOR 123 Main St NORFOLK VA 23510".to_string();
        ledger.add(n).await.unwrap();
        let lookup = MockLookup::new().with_summary("Blue Door", "A neighborhood restaurant and bakery.");

        let summary = ledger
            .auto_search_and_classify(&lookup, Duration::ZERO, |_, _, _| {})
            .await
            .unwrap();
        assert_eq!(summary.classified, 1);
        assert_eq!(ledger.transactions().await.unwrap()[0].category, Category::Dining);

        // cached: the backend is not asked again for the same query
        let mut second = new_tx((2024, 3, 5), "Blue Door", 1800, "Card");
        second.original_description = "BLUE DOOR 123 Main St NORFOLK VA 23510".to_string();
        ledger.add(second).await.unwrap();
        ledger
            .auto_search_and_classify(&lookup, Duration::ZERO, |_, _, _| {})
            .await
            .unwrap();
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn sqlite_backed_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("ledger.db")).await.unwrap();
        let rules = CategoryRules::with_overrides(RuleOverrides::default()).unwrap();
        let ledger = Ledger::new(store, rules);

        ledger.add(new_tx((2024, 3, 1), "Starbucks", 550, "Card")).await.unwrap();
        let txs = ledger.transactions().await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].category, Category::Dining);
    }
}
