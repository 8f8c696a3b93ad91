use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spendlens_classify::{
    BusinessLookup, Classification, ConfirmedTransfer, LookupOutcome, SearchSummary, TransactionContext,
    TransferPair, VendorApplySummary, VendorGroup,
};
use spendlens_core::analysis::{self, CategorySummary, Kpis, MerchantSummary, MonthlySummary, Recommendation};
use spendlens_core::budget::{Budget, BudgetComparison};
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::period::{DateRange, Month};
use spendlens_core::transaction::{Transaction, TransactionFilter, TransactionPatch};
use spendlens_import::{
    import_json_with_rules, CsvImportProfile, CsvImporter, ExtractorChain, ImportError, ManualEntry,
    StatementDocument,
};
use spendlens_storage::{CategoryAssignment, KeyValueStore, Ledger};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::LookupConfig;
use crate::error::{ok, ApiError, ApiResult};

/// Shared handler state. The ledger sits behind one mutex so there is a
/// single writer at a time.
pub struct AppState<S, L> {
    pub ledger: Mutex<Ledger<S>>,
    pub lookup: L,
    pub lookup_config: LookupConfig,
}

impl<S, L> AppState<S, L>
where
    S: KeyValueStore + 'static,
    L: BusinessLookup + 'static,
{
    pub fn new(ledger: Ledger<S>, lookup: L, lookup_config: LookupConfig) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            lookup,
            lookup_config,
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/api/health", get(health))
            .route(
                "/api/transactions",
                get(Self::list_transactions)
                    .post(Self::add_transaction)
                    .delete(Self::clear_all),
            )
            .route(
                "/api/transactions/{id}",
                axum::routing::patch(Self::update_transaction).delete(Self::remove_transaction),
            )
            .route("/api/transactions/{id}/category", post(Self::assign_category))
            .route("/api/transactions/{id}/context", get(Self::transaction_context))
            .route("/api/transactions/{id}/lookup", get(Self::lookup_transaction))
            .route("/api/accounts", get(Self::accounts))
            .route("/api/months", get(Self::months))
            .route("/api/import/csv", post(Self::import_csv))
            .route("/api/import/json", post(Self::import_json))
            .route("/api/import/statement", post(Self::import_statement))
            .route("/api/classify/reclassify", post(Self::reclassify))
            .route("/api/classify/unclassified", get(Self::unclassified))
            .route("/api/vendors", get(Self::vendor_groups))
            .route("/api/vendors/apply", post(Self::apply_vendor))
            .route("/api/vendors/apply-all", post(Self::apply_all_vendors))
            .route("/api/transfers/candidates", get(Self::transfer_candidates))
            .route("/api/transfers", get(Self::confirmed_transfers).post(Self::mark_transfer))
            .route("/api/transfers/{link}", axum::routing::delete(Self::unmark_transfer))
            .route("/api/budget", get(Self::budget).put(Self::save_budget))
            .route("/api/budget/generate", post(Self::generate_budget))
            .route("/api/analytics/monthly", get(Self::monthly))
            .route("/api/analytics/categories", get(Self::categories))
            .route("/api/analytics/merchants", get(Self::merchants))
            .route("/api/analytics/kpis", get(Self::kpis))
            .route("/api/analytics/recommendations", get(Self::recommendations))
            .route("/api/lookup/auto", post(Self::auto_lookup))
            .with_state(Arc::new(self))
    }

    // ── Transactions ──────────────────────────────────────────────────────────

    async fn list_transactions(
        State(state): State<Arc<Self>>,
        Query(query): Query<TransactionQuery>,
    ) -> ApiResult<Vec<Transaction>> {
        let filter = query.into_filter()?;
        ok(state.ledger.lock().await.filter(&filter).await?)
    }

    async fn add_transaction(
        State(state): State<Arc<Self>>,
        Json(entry): Json<ManualEntry>,
    ) -> ApiResult<Transaction> {
        let ledger = state.ledger.lock().await;
        let new = entry.into_new_transaction(ledger.rules());
        ok(ledger.add(new).await?)
    }

    async fn clear_all(State(state): State<Arc<Self>>) -> ApiResult<()> {
        ok(state.ledger.lock().await.clear_all().await?)
    }

    async fn update_transaction(
        State(state): State<Arc<Self>>,
        Path(id): Path<String>,
        Json(patch): Json<TransactionPatch>,
    ) -> ApiResult<Transaction> {
        ok(state.ledger.lock().await.update(&id, patch).await?)
    }

    async fn remove_transaction(State(state): State<Arc<Self>>, Path(id): Path<String>) -> ApiResult<()> {
        ok(state.ledger.lock().await.remove(&id).await?)
    }

    async fn assign_category(
        State(state): State<Arc<Self>>,
        Path(id): Path<String>,
        Json(body): Json<CategoryBody>,
    ) -> ApiResult<CategoryAssignment> {
        ok(state.ledger.lock().await.assign_category(&id, body.category).await?)
    }

    async fn transaction_context(
        State(state): State<Arc<Self>>,
        Path(id): Path<String>,
    ) -> ApiResult<TransactionContext> {
        ok(state.ledger.lock().await.transaction_context(&id).await?)
    }

    async fn lookup_transaction(State(state): State<Arc<Self>>, Path(id): Path<String>) -> ApiResult<LookupOutcome> {
        if !state.lookup_config.enabled {
            return Err(ApiError::LookupDisabled);
        }
        let ledger = state.ledger.lock().await;
        ok(ledger.search_for_context(&id, &state.lookup).await?)
    }

    async fn accounts(State(state): State<Arc<Self>>) -> ApiResult<Vec<String>> {
        ok(state.ledger.lock().await.accounts().await?)
    }

    async fn months(State(state): State<Arc<Self>>) -> ApiResult<Vec<Month>> {
        ok(state.ledger.lock().await.months().await?)
    }

    // ── Import ────────────────────────────────────────────────────────────────

    async fn import_csv(State(state): State<Arc<Self>>, Json(body): Json<CsvImportBody>) -> ApiResult<ImportReport> {
        let ledger = state.ledger.lock().await;
        let profile = body.profile.unwrap_or_default();
        let summary = CsvImporter::new(ledger.rules())
            .import(body.content.as_bytes(), &profile)
            .map_err(ImportError::from)?;
        let added = ledger.add_many(summary.transactions).await?;
        ok(ImportReport::new(added, summary.skipped))
    }

    async fn import_json(State(state): State<Arc<Self>>, Json(body): Json<JsonImportBody>) -> ApiResult<ImportReport> {
        let ledger = state.ledger.lock().await;
        let summary = import_json_with_rules(&body.content, &body.source_name, ledger.rules())
            .map_err(ImportError::from)?;
        let added = ledger.add_many(summary.transactions).await?;
        ok(ImportReport::new(added, summary.skipped))
    }

    async fn import_statement(
        State(state): State<Arc<Self>>,
        Json(doc): Json<StatementDocument>,
    ) -> ApiResult<ImportReport> {
        let doc = StatementDocument::new(doc.source_name, doc.fallback_year, doc.fragments);
        let ledger = state.ledger.lock().await;
        let extracted = ExtractorChain::default().extract(&doc, ledger.rules())?;
        let added = ledger.add_many(extracted).await?;
        ok(ImportReport::new(added, 0))
    }

    // ── Classification ────────────────────────────────────────────────────────

    async fn reclassify(State(state): State<Arc<Self>>) -> ApiResult<UpdatedCount> {
        let updated = state.ledger.lock().await.reclassify_all().await?;
        ok(UpdatedCount { updated })
    }

    async fn unclassified(State(state): State<Arc<Self>>) -> ApiResult<Vec<Classification>> {
        ok(state.ledger.lock().await.analyze_unclassified().await?)
    }

    async fn vendor_groups(State(state): State<Arc<Self>>) -> ApiResult<Vec<VendorGroup>> {
        ok(state.ledger.lock().await.actionable_vendor_groups().await?)
    }

    async fn apply_vendor(State(state): State<Arc<Self>>, Json(body): Json<VendorApplyBody>) -> ApiResult<UpdatedCount> {
        let updated = state
            .ledger
            .lock()
            .await
            .apply_vendor_category(&body.vendor_key, body.category)
            .await?;
        ok(UpdatedCount { updated })
    }

    async fn apply_all_vendors(State(state): State<Arc<Self>>) -> ApiResult<VendorApplySummary> {
        ok(state.ledger.lock().await.apply_all_vendor_categories().await?)
    }

    // ── Transfers ─────────────────────────────────────────────────────────────

    async fn transfer_candidates(State(state): State<Arc<Self>>) -> ApiResult<Vec<TransferPair>> {
        ok(state.ledger.lock().await.detect_transfer_pairs().await?)
    }

    async fn confirmed_transfers(State(state): State<Arc<Self>>) -> ApiResult<Vec<ConfirmedTransfer>> {
        ok(state.ledger.lock().await.confirmed_transfers().await?)
    }

    async fn mark_transfer(State(state): State<Arc<Self>>, Json(body): Json<TransferBody>) -> ApiResult<TransferLink> {
        let link_id = state.ledger.lock().await.mark_transfer_pair(&body.id1, &body.id2).await?;
        ok(TransferLink { link_id })
    }

    async fn unmark_transfer(State(state): State<Arc<Self>>, Path(link): Path<String>) -> ApiResult<UpdatedCount> {
        let updated = state.ledger.lock().await.unmark_transfer_pair(&link).await?;
        ok(UpdatedCount { updated })
    }

    // ── Budget ────────────────────────────────────────────────────────────────

    async fn budget(State(state): State<Arc<Self>>) -> ApiResult<BudgetView> {
        let ledger = state.ledger.lock().await;
        let budget = ledger.budget().await?;
        let txs = ledger.transactions().await?;
        ok(BudgetView::new(budget, &txs))
    }

    async fn save_budget(State(state): State<Arc<Self>>, Json(budget): Json<Budget>) -> ApiResult<Budget> {
        state.ledger.lock().await.save_budget(&budget).await?;
        ok(budget)
    }

    async fn generate_budget(
        State(state): State<Arc<Self>>,
        Json(body): Json<GenerateBudgetBody>,
    ) -> ApiResult<Budget> {
        if body.reduction_percent < Decimal::ZERO || body.reduction_percent > Decimal::ONE_HUNDRED {
            return Err(ApiError::BadRequest("reductionPercent must be between 0 and 100".to_string()));
        }
        ok(state.ledger.lock().await.auto_generate_budget(body.reduction_percent).await?)
    }

    // ── Analytics ─────────────────────────────────────────────────────────────

    async fn monthly(State(state): State<Arc<Self>>) -> ApiResult<Vec<MonthlySummary>> {
        let txs = state.ledger.lock().await.transactions().await?;
        ok(analysis::monthly_breakdown(&txs))
    }

    async fn categories(State(state): State<Arc<Self>>) -> ApiResult<Vec<CategorySummary>> {
        let txs = state.ledger.lock().await.transactions().await?;
        ok(analysis::category_breakdown(&txs))
    }

    async fn merchants(State(state): State<Arc<Self>>) -> ApiResult<Vec<MerchantSummary>> {
        let txs = state.ledger.lock().await.transactions().await?;
        ok(analysis::merchant_breakdown(&txs))
    }

    async fn kpis(State(state): State<Arc<Self>>) -> ApiResult<Kpis> {
        let txs = state.ledger.lock().await.transactions().await?;
        ok(analysis::kpis(&txs))
    }

    async fn recommendations(State(state): State<Arc<Self>>) -> ApiResult<Vec<Recommendation>> {
        let txs = state.ledger.lock().await.transactions().await?;
        ok(analysis::savings_recommendations(&txs))
    }

    // ── Lookups ───────────────────────────────────────────────────────────────

    async fn auto_lookup(State(state): State<Arc<Self>>) -> ApiResult<SearchSummary> {
        if !state.lookup_config.enabled {
            return Err(ApiError::LookupDisabled);
        }
        let ledger = state.ledger.lock().await;
        let summary = ledger
            .auto_search_and_classify(&state.lookup, state.lookup_config.delay(), |n, total, desc| {
                tracing::debug!(n, total, description = desc, "looking up business");
            })
            .await?;
        ok(summary)
    }
}

async fn health() -> ApiResult<Health> {
    ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Request and response bodies ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

/// Query string for `GET /api/transactions`. `from` and `to` must come
/// together.
#[derive(Debug, Default, Deserialize)]
struct TransactionQuery {
    account: Option<String>,
    cardholder: Option<String>,
    category: Option<Category>,
    month: Option<Month>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    search: Option<String>,
}

impl TransactionQuery {
    fn into_filter(self) -> Result<TransactionFilter, ApiError> {
        let range = match (self.from, self.to) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            (None, None) => None,
            _ => return Err(ApiError::BadRequest("`from` and `to` must be given together".to_string())),
        };
        Ok(TransactionFilter {
            account: self.account,
            cardholder: self.cardholder,
            category: self.category,
            month: self.month,
            range,
            search: self.search,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CategoryBody {
    category: Category,
}

#[derive(Debug, Deserialize)]
struct CsvImportBody {
    content: String,
    #[serde(default)]
    profile: Option<CsvImportProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonImportBody {
    content: String,
    #[serde(default = "default_json_source")]
    source_name: String,
}

fn default_json_source() -> String {
    "JSON Import".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportReport {
    imported: usize,
    skipped: usize,
    transactions: Vec<Transaction>,
}

impl ImportReport {
    fn new(transactions: Vec<Transaction>, skipped: usize) -> Self {
        Self {
            imported: transactions.len(),
            skipped,
            transactions,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdatedCount {
    updated: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VendorApplyBody {
    vendor_key: String,
    category: Category,
}

#[derive(Debug, Deserialize)]
struct TransferBody {
    id1: String,
    id2: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferLink {
    link_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBudgetBody {
    #[serde(default = "default_reduction")]
    reduction_percent: Decimal,
}

fn default_reduction() -> Decimal {
    Decimal::TEN
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthActual {
    category: Category,
    target: Money,
    actual: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BudgetView {
    budget: Budget,
    comparison: Vec<BudgetComparison>,
    latest_month: Vec<MonthActual>,
}

impl BudgetView {
    fn new(budget: Budget, txs: &[Transaction]) -> Self {
        let comparison = budget.compare(&analysis::category_breakdown(txs));
        let latest_month = budget
            .latest_month_actuals(txs)
            .into_iter()
            .map(|(category, target, actual)| MonthActual { category, target, actual })
            .collect();
        Self {
            budget,
            comparison,
            latest_month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use spendlens_classify::MockLookup;
    use spendlens_core::rules::{CategoryRules, RuleOverrides};
    use spendlens_storage::MemoryStore;
    use tower::ServiceExt;

    fn app_with(lookup: MockLookup, enabled: bool) -> Router {
        let rules = CategoryRules::with_overrides(RuleOverrides::default()).unwrap();
        let ledger = Ledger::new(MemoryStore::new(), rules);
        let lookup_config = LookupConfig {
            enabled,
            delay_ms: 0,
            ..LookupConfig::default()
        };
        AppState::new(ledger, lookup, lookup_config).router()
    }

    fn app() -> Router {
        app_with(MockLookup::new(), false)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    // ── transactions ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = call(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn manual_entry_then_filtered_list() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/transactions",
            Some(json!({"date": "2024-03-01", "description": "Netflix", "amount": 15.99})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["category"], "Entertainment");
        assert_eq!(body["data"]["account"], "Manual");

        call(
            &app,
            "POST",
            "/api/transactions",
            Some(json!({"date": "2024-04-01", "description": "Zqx Holdings", "amount": 20})),
        )
        .await;

        let (_, body) = call(&app, "GET", "/api/transactions?month=2024-03", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        let (_, body) = call(&app, "GET", "/api/transactions?category=Other", None).await;
        assert_eq!(body["data"][0]["description"], "Zqx Holdings");
        let (status, _) = call(&app, "GET", "/api/transactions?from=2024-03-01", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let (status, body) = call(
            &app(),
            "PATCH",
            "/api/transactions/nope",
            Some(json!({"category": "Dining"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Transaction not found: nope");
    }

    // ── import ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn csv_import_counts_skipped_rows() {
        let app = app();
        let content = "Date,Description,Amount\n03/01/2024,Netflix,15.99\n13/45/2024,Bad Row,1.00\n";
        let (status, body) = call(&app, "POST", "/api/import/csv", Some(json!({"content": content}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["imported"], 1);
        assert_eq!(body["data"]["skipped"], 1);

        let (_, body) = call(&app, "GET", "/api/accounts", None).await;
        assert_eq!(body["data"], json!(["CSV Import"]));
    }

    #[tokio::test]
    async fn unreadable_statement_is_unprocessable() {
        let doc = json!({"sourceName": "empty.pdf", "fallbackYear": 2024, "fragments": []});
        let (status, body) = call(&app(), "POST", "/api/import/statement", Some(doc)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
    }

    // ── transfers and budget ──────────────────────────────────────────────────

    #[tokio::test]
    async fn transfer_mark_and_unmark() {
        let app = app();
        let (_, a) = call(
            &app,
            "POST",
            "/api/transactions",
            Some(json!({"date": "2024-03-01", "description": "Card Pmt", "amount": 42, "account": "Checking"})),
        )
        .await;
        let (_, b) = call(
            &app,
            "POST",
            "/api/transactions",
            Some(json!({"date": "2024-03-02", "description": "Thank You", "amount": 42, "account": "CreditCard", "isIncome": true})),
        )
        .await;

        let (_, candidates) = call(&app, "GET", "/api/transfers/candidates", None).await;
        assert!(candidates["data"][0]["reason"].as_str().unwrap().contains("1 day apart"));

        let ids = json!({"id1": a["data"]["id"], "id2": b["data"]["id"]});
        let (status, marked) = call(&app, "POST", "/api/transfers", Some(ids.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "POST", "/api/transfers", Some(ids)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let link = marked["data"]["linkId"].as_str().unwrap().to_string();
        let (_, body) = call(&app, "DELETE", &format!("/api/transfers/{link}"), None).await;
        assert_eq!(body["data"]["updated"], 2);
    }

    #[tokio::test]
    async fn budget_generation_and_view() {
        let app = app();
        call(
            &app,
            "POST",
            "/api/transactions",
            Some(json!({"date": "2024-03-01", "description": "Netflix", "amount": 20})),
        )
        .await;
        let (status, _) = call(&app, "POST", "/api/budget/generate", Some(json!({"reductionPercent": 150}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, generated) = call(&app, "POST", "/api/budget/generate", Some(json!({}))).await;
        assert_eq!(generated["data"]["Entertainment"]["target"], 18.0);

        let (_, view) = call(&app, "GET", "/api/budget", None).await;
        assert_eq!(view["data"]["comparison"][0]["status"], "overBudget");
        assert_eq!(view["data"]["latestMonth"][0]["actual"], 20.0);
    }

    // ── lookups ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn lookups_disabled_by_default() {
        let (status, body) = call(&app(), "POST", "/api/lookup/auto", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Web lookups are disabled");
    }

    #[tokio::test]
    async fn context_lookup_suggests_category() {
        let lookup = MockLookup::new().with_summary("Blue Door", "A neighborhood restaurant and bakery.");
        let app = app_with(lookup, true);
        let (_, added) = call(
            &app,
            "POST",
            "/api/transactions",
            Some(json!({"date": "2024-03-01", "description": "Blue Door", "amount": 18})),
        )
        .await;
        let id = added["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "GET", &format!("/api/transactions/{id}/lookup"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["suggestedCategory"], "Dining");

        let (status, body) = call(&app, "POST", "/api/lookup/auto", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["classified"], 0);
    }
}
