//! Best-effort business identification for transactions that carry a
//! street address. Nothing here returns an error to the caller: a failed or
//! slow lookup degrades to "no information".

use reqwest::Url;
use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::re;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::Transaction;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::address::detect_address;
use crate::comparison_key;

const DDG_API: &str = "https://api.duckduckgo.com/";
const DDG_SEARCH: &str = "https://duckduckgo.com/";
const WIKI_SUMMARY: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const MAX_RELATED: usize = 5;

const NO_INFO: &str = "No information found for this business.";
const NO_INSTANT_ANSWER: &str = "No instant answer found. Open the search link for full results.";
const NO_SEARCHABLE: &str = "No searchable description";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Bad URL: {0}")]
    BadUrl(String),
    #[error("Lookup unavailable: {0}")]
    Unavailable(String),
}

/// Descriptive text a backend found for a business.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupText {
    pub summary: String,
    pub business_type: String,
    pub related: Vec<String>,
}

impl LookupText {
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
    }
}

/// A source of descriptive text about a business.
pub trait BusinessLookup: Send + Sync {
    /// `query` is the full search string; `business_name` is the bare name
    /// for sources that want a title.
    fn search(
        &self,
        query: &str,
        business_name: &str,
    ) -> impl Future<Output = Result<LookupText, LookupError>> + Send;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Canned answers keyed by business name (case-insensitive). Unknown names
/// return empty text.
#[derive(Debug, Default)]
pub struct MockLookup {
    responses: HashMap<String, LookupText>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails, as if the network were down.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, business_name: &str, summary: &str) -> Self {
        self.responses.insert(
            business_name.to_lowercase(),
            LookupText {
                summary: summary.to_string(),
                business_type: business_name.to_string(),
                related: Vec::new(),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BusinessLookup for MockLookup {
    async fn search(&self, query: &str, business_name: &str) -> Result<LookupText, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(LookupError::Unavailable(query.to_string()));
        }
        Ok(self
            .responses
            .get(&business_name.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

// ── Web backend ───────────────────────────────────────────────────────────────

/// DuckDuckGo instant answers, falling back to the Wikipedia page summary
/// for the business name.
pub struct WebLookup {
    client: reqwest::Client,
    ddg_timeout: Duration,
    wiki_timeout: Duration,
}

impl WebLookup {
    pub fn new(ddg_timeout: Duration, wiki_timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("spendlens/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            ddg_timeout,
            wiki_timeout,
        })
    }

    async fn instant_answer(&self, query: &str) -> Result<LookupText, LookupError> {
        let url = Url::parse_with_params(
            DDG_API,
            &[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| LookupError::BadUrl(e.to_string()))?;
        let body = self
            .client
            .get(url)
            .timeout(self.ddg_timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_instant_answer(&body)
    }

    async fn wiki_summary(&self, title: &str) -> Result<LookupText, LookupError> {
        let mut url = Url::parse(WIKI_SUMMARY).map_err(|e| LookupError::BadUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::BadUrl(WIKI_SUMMARY.to_string()))?
            .pop_if_empty()
            .push(title);
        let resp = self.client.get(url).timeout(self.wiki_timeout).send().await?;
        if !resp.status().is_success() {
            return Ok(LookupText::default());
        }
        let page: WikiSummary = resp.json().await?;
        Ok(LookupText {
            summary: page.extract.unwrap_or_default(),
            business_type: page.title.unwrap_or_default(),
            related: Vec::new(),
        })
    }
}

impl BusinessLookup for WebLookup {
    async fn search(&self, query: &str, business_name: &str) -> Result<LookupText, LookupError> {
        let ddg = match self.instant_answer(query).await {
            Ok(text) if !text.is_empty() => return Ok(text),
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::debug!(query, error = %e, "instant answer lookup failed");
                Err(e)
            }
        };

        match self.wiki_summary(business_name).await {
            Ok(text) if !text.is_empty() => Ok(text),
            Ok(_) => Ok(ddg.unwrap_or_default()),
            Err(e) => {
                tracing::debug!(business_name, error = %e, "wikipedia lookup failed");
                // only an error when neither source answered
                ddg.or(Err(e))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstantAnswer {
    #[serde(rename = "Abstract")]
    abstract_summary: String,
    #[serde(rename = "AbstractText")]
    abstract_text: String,
    #[serde(rename = "Heading")]
    heading: String,
    #[serde(rename = "RelatedTopics")]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RelatedTopic {
    #[serde(rename = "Text")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WikiSummary {
    extract: Option<String>,
    title: Option<String>,
}

fn parse_instant_answer(body: &str) -> Result<LookupText, LookupError> {
    let answer: InstantAnswer = serde_json::from_str(body)?;
    let summary = if answer.abstract_summary.is_empty() {
        answer.abstract_text
    } else {
        answer.abstract_summary
    };
    let related = answer
        .related_topics
        .into_iter()
        .filter_map(|t| t.text.filter(|s| !s.is_empty()))
        .take(MAX_RELATED)
        .collect();
    Ok(LookupText {
        summary,
        business_type: answer.heading,
        related,
    })
}

// ── Category inference ────────────────────────────────────────────────────────

const TEXT_SIGNALS: &[(Category, &[&str])] = &[
    (
        Category::Dining,
        &[
            "restaurant", "food", "dining", "cuisine", "eatery", "chef", "menu", "meal", "brunch",
            "breakfast", "lunch", "dinner", "fast food", "pizza", "burger", "sushi", "wine bar",
            "cocktail", "pub", "tavern", "café", "cafe", "coffee shop", "bakery", "ice cream",
            "barbecue", "bbq", "deli", "catering", "bistro",
        ],
    ),
    (
        Category::Groceries,
        &["grocery", "supermarket", "food store", "produce", "meat market"],
    ),
    (
        Category::Transportation,
        &[
            "gasoline", "fuel", "gas station", "petroleum", "car wash", "auto repair", "mechanic",
            "tire", "automotive", "parking", "ride-hailing", "rideshare", "taxi", "cab",
        ],
    ),
    (
        Category::Travel,
        &[
            "hotel", "motel", "resort", "airline", "travel", "tourism", "flight", "cruise",
            "vacation", "lodging", "accommodation",
        ],
    ),
    (
        Category::Shopping,
        &[
            "retail", "clothing", "apparel", "fashion", "shoes", "electronics", "hardware",
            "home improvement", "department store", "discount store", "furniture", "jewelry",
            "eyewear", "optical",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "entertainment", "cinema", "movie", "theater", "concert", "music", "gaming",
            "amusement", "theme park", "streaming", "sports",
        ],
    ),
    (
        Category::Healthcare,
        &[
            "medical", "health", "hospital", "doctor", "pharmacy", "dental", "clinic",
            "healthcare", "wellness", "therapeutic", "pharmaceutical",
        ],
    ),
    (
        Category::Subscriptions,
        &[
            "subscription", "software", "saas", "platform", "digital service", "cloud",
            "streaming service", "membership",
        ],
    ),
    (
        Category::Insurance,
        &["insurance", "insurer", "coverage", "policy", "underwriting"],
    ),
    (
        Category::Education,
        &[
            "school", "college", "university", "education", "learning", "tuition", "academic",
            "training",
        ],
    ),
    (
        Category::PersonalCare,
        &[
            "salon", "barber", "beauty", "spa", "wellness", "grooming", "cosmetic", "skincare",
            "nail",
        ],
    ),
    (
        Category::GiftsAndDonations,
        &["charity", "nonprofit", "donation", "foundation", "church", "religious"],
    ),
    (
        Category::Housing,
        &["rent", "mortgage", "property", "real estate", "leasing", "landlord"],
    ),
    (
        Category::Utilities,
        &[
            "utility", "electric", "water", "gas ", "internet", "telecommunications", "telecom",
            "phone", "wireless", "broadband", "cable",
        ],
    ),
];

/// Votes on indicator words contained in free text. The category with the
/// most hits wins; on a tie the earlier table entry keeps the lead.
pub fn infer_category_from_text(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    let mut best: Option<(Category, usize)> = None;
    for (category, words) in TEXT_SIGNALS {
        let hits = words.iter().filter(|w| lower.contains(*w)).count();
        if hits > best.map_or(0, |(_, n)| n) {
            best = Some((*category, hits));
        }
    }
    best.map(|(category, _)| category)
}

// ── Outcomes and cache ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOutcome {
    pub query: String,
    pub summary: String,
    pub business_type: String,
    pub suggested_category: Option<Category>,
    pub related: Vec<String>,
    /// Link a person can open for the full results. Empty when there was
    /// nothing to search for.
    pub search_url: String,
}

/// Past outcomes keyed by the case-folded alphanumerics of the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupCache(BTreeMap<String, LookupOutcome>);

impl LookupCache {
    pub fn get(&self, query: &str) -> Option<&LookupOutcome> {
        self.0.get(&comparison_key(query))
    }

    pub fn insert(&mut self, query: &str, outcome: LookupOutcome) {
        self.0.insert(comparison_key(query), outcome);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn search_url(query: &str) -> String {
    Url::parse_with_params(DDG_SEARCH, &[("q", query)])
        .map(String::from)
        .unwrap_or_default()
}

/// Text inference first, then the rule tables against the bare business name.
fn business_outcome(query: &str, business_name: &str, text: LookupText, rules: &CategoryRules) -> LookupOutcome {
    let mut summary = text.summary;
    let mut suggested_category = if summary.is_empty() {
        None
    } else {
        infer_category_from_text(&format!("{summary} {}", text.related.join(" ")))
    };

    if suggested_category.is_none() {
        if let Some(rule) = rules.first_pattern(&business_name.to_lowercase()) {
            suggested_category = Some(rule.category);
            if summary.is_empty() {
                summary = rule.reason.clone();
            }
        }
    }
    if suggested_category.is_none() {
        if let Some((category, keyword)) = rules.first_keyword_match(business_name) {
            suggested_category = Some(category);
            if summary.is_empty() {
                summary = format!("Keyword \"{}\" matches category {category}", keyword.trim());
            }
        }
    }

    LookupOutcome {
        query: query.to_string(),
        summary: if summary.is_empty() { NO_INFO.to_string() } else { summary },
        business_type: text.business_type,
        suggested_category,
        related: text.related,
        search_url: search_url(query),
    }
}

// ── Batch and single lookups ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub transaction_id: String,
    pub business_name: String,
    pub address_text: String,
    pub outcome: LookupOutcome,
    pub applied_category: Option<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub classified: usize,
    pub searched: usize,
    pub results: Vec<SearchResult>,
}

/// Looks up every uncategorized transaction that carries an address and
/// applies the suggested category. Cached queries skip the network and the
/// delay; a failed lookup leaves its transaction untouched and the loop
/// carries on. `progress` gets `(current, total, description)`.
pub async fn auto_search_and_classify<L, F>(
    txs: &mut [Transaction],
    lookup: &L,
    cache: &mut LookupCache,
    rules: &CategoryRules,
    delay: Duration,
    mut progress: F,
) -> SearchSummary
where
    L: BusinessLookup,
    F: FnMut(usize, usize, &str),
{
    let work: Vec<(usize, String, String)> = txs
        .iter()
        .enumerate()
        .filter(|(_, t)| t.category.is_other() && !t.manual_override)
        .filter_map(|(i, t)| detect_address(t).map(|m| (i, m.business_name, m.address_text)))
        .collect();

    let total = work.len();
    let mut summary = SearchSummary {
        searched: total,
        ..SearchSummary::default()
    };

    for (n, (i, business_name, address_text)) in work.into_iter().enumerate() {
        progress(n + 1, total, &txs[i].description);
        let query = format!("{business_name} {address_text}").trim().to_string();

        let outcome = match cache.get(&query) {
            Some(hit) => hit.clone(),
            None => {
                let outcome = match lookup.search(&query, &business_name).await {
                    Ok(text) => {
                        let outcome = business_outcome(&query, &business_name, text, rules);
                        cache.insert(&query, outcome.clone());
                        outcome
                    }
                    Err(e) => {
                        tracing::debug!(query = %query, error = %e, "business lookup failed");
                        business_outcome(&query, &business_name, LookupText::default(), rules)
                    }
                };
                tokio::time::sleep(delay).await;
                outcome
            }
        };

        let applied_category = outcome.suggested_category;
        if let Some(category) = applied_category {
            txs[i].category = category;
            summary.classified += 1;
        }
        summary.results.push(SearchResult {
            transaction_id: txs[i].id.clone(),
            business_name,
            address_text,
            outcome,
            applied_category,
        });
    }

    tracing::info!(searched = summary.searched, classified = summary.classified, "address lookup finished");
    summary
}

re!(re_unsearchable, r"[^a-zA-Z0-9\s&'-]");

/// Looks up one transaction's description for a person to read. Only the
/// returned text is inferred from; the rule tables are not consulted.
pub async fn search_for_context<L: BusinessLookup>(
    tx: &Transaction,
    lookup: &L,
    cache: &mut LookupCache,
) -> LookupOutcome {
    let desc = if tx.description.trim().is_empty() {
        tx.source_text()
    } else {
        tx.description.as_str()
    };
    if let Some(hit) = cache.get(desc) {
        return hit.clone();
    }

    let query = re_unsearchable().replace_all(desc, "").trim().to_string();
    if query.is_empty() {
        return LookupOutcome {
            query,
            summary: NO_SEARCHABLE.to_string(),
            business_type: String::new(),
            suggested_category: None,
            related: Vec::new(),
            search_url: String::new(),
        };
    }

    let text = match lookup.search(&query, &query).await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(query = %query, error = %e, "context lookup failed");
            return LookupOutcome {
                summary: NO_INSTANT_ANSWER.to_string(),
                business_type: String::new(),
                suggested_category: None,
                related: Vec::new(),
                search_url: search_url(&format!("{query} business")),
                query,
            };
        }
    };

    let outcome = LookupOutcome {
        suggested_category: infer_category_from_text(&text.summary),
        summary: if text.is_empty() { NO_INSTANT_ANSWER.to_string() } else { text.summary },
        business_type: text.business_type,
        related: text.related,
        search_url: search_url(&format!("{query} business")),
        query,
    };
    cache.insert(desc, outcome.clone());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{tx, with_category};

    fn at(id: &str, desc: &str, original: &str) -> Transaction {
        let mut t = tx(id, (2024, 3, 1), desc, 2500);
        t.original_description = original.to_string();
        t
    }

    // ── inference ─────────────────────────────────────────────────────────────

    #[test]
    fn infer_counts_indicator_words() {
        assert_eq!(
            infer_category_from_text("A grocery chain and supermarket"),
            Some(Category::Groceries)
        );
        assert_eq!(
            infer_category_from_text("Blue Door Cafe is a restaurant serving breakfast and lunch."),
            Some(Category::Dining)
        );
        assert_eq!(infer_category_from_text("Zqx Holdings LLC"), None);
    }

    #[test]
    fn infer_tie_keeps_earlier_category() {
        assert_eq!(infer_category_from_text("hotel restaurant"), Some(Category::Dining));
    }

    #[test]
    fn instant_answer_parsing() {
        let body = r#"{
            "Abstract": "",
            "AbstractText": "Shell is an oil and gasoline company.",
            "Heading": "Shell plc",
            "RelatedTopics": [
                {"Text": "Shell station"},
                {"Name": "Group", "Topics": []},
                {"Text": "A"}, {"Text": "B"}, {"Text": "C"}, {"Text": "D"}, {"Text": "E"}
            ]
        }"#;
        let text = parse_instant_answer(body).unwrap();
        assert_eq!(text.summary, "Shell is an oil and gasoline company.");
        assert_eq!(text.business_type, "Shell plc");
        assert_eq!(text.related, vec!["Shell station", "A", "B", "C", "D"]);
        assert!(parse_instant_answer("not json").is_err());
    }

    #[test]
    fn search_url_encodes_query() {
        assert_eq!(search_url("Joe's Pub & Grill"), "https://duckduckgo.com/?q=Joe%27s+Pub+%26+Grill");
    }

    // ── auto search ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn auto_search_applies_text_inference() {
        let lookup = MockLookup::new()
            .with_summary("Blue Door Cafe", "Blue Door Cafe is a restaurant serving breakfast and lunch.");
        let mut txs = vec![
            at("a", "Blue Door Cafe", "BLUE DOOR CAFE 123 Main St NORFOLK VA 23510"),
            tx("plain", (2024, 3, 1), "Zqx Holdings", 100),
            with_category(at("done", "Corner Deli", "CORNER DELI 9 Elm St"), Category::Dining),
        ];
        let mut cache = LookupCache::default();
        let mut seen = Vec::new();

        let summary = auto_search_and_classify(
            &mut txs,
            &lookup,
            &mut cache,
            CategoryRules::builtin(),
            Duration::ZERO,
            |n, total, desc| seen.push(format!("{n}/{total} {desc}")),
        )
        .await;

        assert_eq!(summary.searched, 1);
        assert_eq!(summary.classified, 1);
        assert_eq!(seen, vec!["1/1 Blue Door Cafe"]);
        assert_eq!(txs[0].category, Category::Dining);
        assert_eq!(txs[1].category, Category::Other);
        let result = &summary.results[0];
        assert_eq!(result.business_name, "Blue Door Cafe");
        assert!(result.outcome.query.starts_with("Blue Door Cafe 123 Main St"));
        assert_eq!(result.applied_category, Some(Category::Dining));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn rule_fallbacks_on_business_name() {
        let lookup = MockLookup::new();
        let mut txs = vec![
            at("pub", "Joe's Pub 12 Oak Ave", "JOE'S PUB 12 Oak Ave"),
            at("kw", "Netflix 100 Winchester Blvd", "NETFLIX 100 Winchester Blvd"),
            at("none", "Zqx Holdings 7 Pine Rd", "ZQX HOLDINGS 7 Pine Rd"),
        ];
        let mut cache = LookupCache::default();
        let summary =
            auto_search_and_classify(&mut txs, &lookup, &mut cache, CategoryRules::builtin(), Duration::ZERO, |_, _, _| {})
                .await;

        assert_eq!(summary.searched, 3);
        assert_eq!(summary.classified, 2);
        assert_eq!(txs[0].category, Category::Dining);
        assert!(summary.results[0].outcome.summary.contains("pub"));
        assert_eq!(txs[1].category, Category::Entertainment);
        assert_eq!(summary.results[1].outcome.summary, "Keyword \"netflix\" matches category Entertainment");
        assert_eq!(txs[2].category, Category::Other);
        assert_eq!(summary.results[2].outcome.summary, NO_INFO);
    }

    #[tokio::test]
    async fn cached_queries_skip_the_backend() {
        let lookup = MockLookup::new().with_summary("Blue Door Cafe", "A bistro and cafe.");
        let mut cache = LookupCache::default();
        for _ in 0..2 {
            let mut txs = vec![at("a", "Blue Door Cafe", "BLUE DOOR CAFE 123 Main St NORFOLK VA 23510")];
            auto_search_and_classify(&mut txs, &lookup, &mut cache, CategoryRules::builtin(), Duration::ZERO, |_, _, _| {})
                .await;
            assert_eq!(txs[0].category, Category::Dining);
        }
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn failures_do_not_abort_or_touch_overrides() {
        let lookup = MockLookup::failing();
        let mut pinned = at("pinned", "Joe's Pub 12 Oak Ave", "JOE'S PUB 12 Oak Ave");
        pinned.manual_override = true;
        let mut txs = vec![
            at("x", "Zqx Holdings 7 Pine Rd", "ZQX HOLDINGS 7 Pine Rd"),
            at("y", "Lucky Noodle 3 Birch Ln", "LUCKY NOODLE 3 Birch Ln"),
            pinned,
        ];
        let mut cache = LookupCache::default();
        let summary =
            auto_search_and_classify(&mut txs, &lookup, &mut cache, CategoryRules::builtin(), Duration::ZERO, |_, _, _| {})
                .await;

        assert_eq!(lookup.calls(), 2);
        assert_eq!(summary.searched, 2);
        assert_eq!(summary.classified, 0);
        assert!(txs.iter().all(|t| t.category == Category::Other));
        assert!(cache.is_empty());
    }

    // ── single lookup ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn context_search_strips_symbols_and_caches() {
        let lookup = MockLookup::new().with_summary("Acme Hotel", "A resort hotel for travel and vacation stays.");
        let mut cache = LookupCache::default();
        let t = tx("a", (2024, 3, 1), "Acme Hotel*", 20000);

        let outcome = search_for_context(&t, &lookup, &mut cache).await;
        assert_eq!(outcome.query, "Acme Hotel");
        assert_eq!(outcome.suggested_category, Some(Category::Travel));
        assert_eq!(outcome.search_url, "https://duckduckgo.com/?q=Acme+Hotel+business");

        let again = search_for_context(&t, &lookup, &mut cache).await;
        assert_eq!(again, outcome);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn context_search_with_nothing_searchable() {
        let lookup = MockLookup::new();
        let mut cache = LookupCache::default();
        let t = tx("a", (2024, 3, 1), "***", 100);
        let outcome = search_for_context(&t, &lookup, &mut cache).await;
        assert_eq!(outcome.summary, NO_SEARCHABLE);
        assert!(outcome.search_url.is_empty());
        assert_eq!(lookup.calls(), 0);
    }
}
