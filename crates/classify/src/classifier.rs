use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::Transaction;

use crate::comparison_key;

/// Points each signal adds to a category's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub pattern: u32,
    pub keyword: u32,
    pub small_amount: u32,
    pub meal_amount: u32,
    pub travel_cluster: u32,
    pub dining_cluster: u32,
    pub learned: u32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            pattern: 30,
            keyword: 20,
            small_amount: 5,
            meal_amount: 3,
            travel_cluster: 15,
            dining_cluster: 8,
            learned: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category: Category,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub transaction_id: String,
    pub suggested_category: Option<Category>,
    /// 0-100.
    pub confidence: u32,
    pub reasons: Vec<String>,
    /// In the order categories first scored.
    pub scores: Vec<CategoryScore>,
}

const NEIGHBOR_WINDOW_DAYS: i64 = 2;
const CLUSTER_MIN: usize = 2;

/// Scores categories for one transaction from independent signals:
/// pattern rules, keywords, amount ranges, nearby transactions and
/// previously categorized look-alikes.
pub struct Classifier<'a> {
    rules: &'a CategoryRules,
    weights: SignalWeights,
}

impl Default for Classifier<'static> {
    fn default() -> Self {
        Self::new(CategoryRules::builtin(), SignalWeights::default())
    }
}

impl<'a> Classifier<'a> {
    pub fn new(rules: &'a CategoryRules, weights: SignalWeights) -> Self {
        Self { rules, weights }
    }

    pub fn classify(&self, tx: &Transaction, all: &[Transaction]) -> Classification {
        let w = &self.weights;
        let desc = tx.description.to_lowercase();
        let original = tx.source_text().to_lowercase();
        let texts = [desc.as_str(), original.as_str()];

        let mut board = ScoreBoard::default();
        let mut reasons = Vec::new();

        for hit in self.rules.pattern_hits(&texts) {
            board.add(hit.category, w.pattern);
            reasons.push(hit.reason.clone());
        }

        for (category, keyword) in self.rules.keyword_hits(&texts) {
            board.add(category, w.keyword);
            reasons.push(format!("keyword \"{keyword}\" matches → {category}"));
        }

        let amount = tx.amount;
        if in_range(amount, 500, 2500) {
            board.add(Category::Dining, w.small_amount);
        }
        if in_range(amount, 2500, 7500) && !desc.contains("gas") && !desc.contains("fuel") {
            board.add(Category::Dining, w.meal_amount);
        }

        let nearby: Vec<&Transaction> = all
            .iter()
            .filter(|t| t.id != tx.id && days_between(t.date, tx.date) <= NEIGHBOR_WINDOW_DAYS)
            .collect();
        let travel = nearby.iter().filter(|t| t.category == Category::Travel).count();
        if travel >= CLUSTER_MIN {
            board.add(Category::Travel, w.travel_cluster);
            reasons.push(format!("{travel} nearby travel transactions, could be part of a trip"));
        }
        let dining = nearby.iter().filter(|t| t.category == Category::Dining).count();
        if dining >= CLUSTER_MIN && in_range(amount, 500, 8000) {
            board.add(Category::Dining, w.dining_cluster);
            reasons.push(format!("{dining} nearby dining transactions, possible meal"));
        }

        let key = comparison_key(&tx.description);
        if !key.is_empty() {
            let learned = all.iter().find(|t| {
                t.id != tx.id && !t.category.is_other() && comparison_key(&t.description) == key
            });
            if let Some(prior) = learned {
                board.add(prior.category, w.learned);
                reasons.push(format!(
                    "Learned: \"{}\" was previously categorized as {}",
                    tx.description, prior.category
                ));
            }
        }

        let (suggested_category, best) = board.best();
        Classification {
            transaction_id: tx.id.clone(),
            suggested_category,
            confidence: best.min(100),
            reasons,
            scores: board.0,
        }
    }
}

#[derive(Default)]
struct ScoreBoard(Vec<CategoryScore>);

impl ScoreBoard {
    fn add(&mut self, category: Category, points: u32) {
        match self.0.iter_mut().find(|s| s.category == category) {
            Some(entry) => entry.score += points,
            None => self.0.push(CategoryScore { category, score: points }),
        }
    }

    /// Highest score; ties keep the category that scored first.
    fn best(&self) -> (Option<Category>, u32) {
        self.0.iter().fold((None, 0), |(cat, best), s| {
            if s.score > best {
                (Some(s.category), s.score)
            } else {
                (cat, best)
            }
        })
    }
}

fn in_range(amount: Money, low_cents: i64, high_cents: i64) -> bool {
    amount >= Money::from_cents(low_cents) && amount <= Money::from_cents(high_cents)
}

pub(crate) fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

/// Classifies every `Other` transaction. Suggestions come first, then
/// higher confidence.
pub fn analyze_unclassified(classifier: &Classifier<'_>, all: &[Transaction]) -> Vec<Classification> {
    let mut results: Vec<Classification> = all
        .iter()
        .filter(|t| t.category.is_other())
        .map(|t| classifier.classify(t, all))
        .collect();
    results.sort_by(|a, b| {
        b.suggested_category
            .is_some()
            .cmp(&a.suggested_category.is_some())
            .then(b.confidence.cmp(&a.confidence))
    });
    results
}

/// Re-runs keyword categorization on every `Other` transaction, first on the
/// display description and then on the original text. Manual overrides are
/// left alone. Returns how many changed.
pub fn reclassify_all(rules: &CategoryRules, txs: &mut [Transaction]) -> usize {
    let mut count = 0;
    for tx in txs.iter_mut().filter(|t| t.category.is_other() && !t.manual_override) {
        let mut category = rules.auto_category(&tx.description);
        if category.is_other() && !tx.original_description.trim().is_empty() {
            category = rules.auto_category(&tx.original_description);
        }
        if !category.is_other() {
            tx.category = category;
            count += 1;
        }
    }
    if count > 0 {
        tracing::info!(reclassified = count, "reclassified uncategorized transactions");
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{tx, with_category};

    // ── classify ──────────────────────────────────────────────────────────────

    #[test]
    fn pub_pattern_plus_meal_amount() {
        let t = tx("a", (2024, 3, 1), "Joe's Pub", 3800);
        let c = Classifier::default().classify(&t, std::slice::from_ref(&t));
        assert_eq!(c.suggested_category, Some(Category::Dining));
        assert_eq!(c.confidence, 33);
        assert!(c.reasons.iter().any(|r| r.contains("pub")));
    }

    #[test]
    fn nothing_matches_means_no_suggestion() {
        let t = tx("a", (2024, 3, 1), "Zqx Holdings", 150000);
        let c = Classifier::default().classify(&t, &[]);
        assert_eq!(c.suggested_category, None);
        assert_eq!(c.confidence, 0);
        assert!(c.scores.is_empty());
    }

    #[test]
    fn keyword_reason_names_keyword_and_category() {
        let t = tx("a", (2024, 3, 1), "Netflix", 1599);
        let c = Classifier::default().classify(&t, &[]);
        assert_eq!(c.suggested_category, Some(Category::Entertainment));
        assert!(c.reasons.iter().any(|r| r == "keyword \"netflix\" matches → Entertainment"));
    }

    #[test]
    fn learned_category_from_identical_description() {
        let prior = with_category(tx("p", (2024, 1, 5), "ACME WIDGETS", 10000), Category::Shopping);
        let t = tx("a", (2024, 3, 1), "Acme Widgets!", 10000);
        let all = vec![prior, t.clone()];
        let c = Classifier::default().classify(&t, &all);
        assert_eq!(c.suggested_category, Some(Category::Shopping));
        assert_eq!(c.confidence, 40);
        assert!(c.reasons.iter().any(|r| r.starts_with("Learned:")));
    }

    #[test]
    fn travel_cluster_boost() {
        let a = with_category(tx("h", (2024, 6, 1), "Hilton", 20000), Category::Travel);
        let b = with_category(tx("f", (2024, 6, 2), "Delta", 30000), Category::Travel);
        let t = tx("x", (2024, 6, 3), "Zqx Holdings", 150000);
        let all = vec![a, b, t.clone()];
        let c = Classifier::default().classify(&t, &all);
        assert_eq!(c.suggested_category, Some(Category::Travel));
        assert_eq!(c.confidence, 15);
    }

    #[test]
    fn tie_goes_to_first_scored_category() {
        let weights = SignalWeights { pattern: 10, keyword: 10, ..SignalWeights::default() };
        let classifier = Classifier::new(CategoryRules::builtin(), weights);
        // Dining from "\bpub\b" pattern, Transportation keyword "parking": 10 each
        let t = tx("a", (2024, 3, 1), "Pub Parking", 150000);
        let c = classifier.classify(&t, &[]);
        assert_eq!(c.suggested_category, Some(Category::Dining));
    }

    #[test]
    fn confidence_is_capped() {
        let weights = SignalWeights { pattern: 100, ..SignalWeights::default() };
        let classifier = Classifier::new(CategoryRules::builtin(), weights);
        let t = tx("a", (2024, 3, 1), "Joe's Pub", 3800);
        assert_eq!(classifier.classify(&t, &[]).confidence, 100);
    }

    // ── batch ─────────────────────────────────────────────────────────────────

    #[test]
    fn analyze_orders_suggestions_first() {
        let all = vec![
            tx("none", (2024, 3, 1), "Zqx Holdings", 150000),
            tx("low", (2024, 3, 1), "Zqx Holdings", 1000),
            tx("high", (2024, 3, 1), "Joe's Pub", 3800),
            with_category(tx("done", (2024, 3, 1), "Netflix", 1599), Category::Entertainment),
        ];
        let results = analyze_unclassified(&Classifier::default(), &all);
        let ids: Vec<&str> = results.iter().map(|c| c.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low", "none"]);
    }

    #[test]
    fn reclassify_uses_original_text_and_skips_overrides() {
        let mut by_original = tx("a", (2024, 3, 1), "Xyz", 1000);
        by_original.original_description = "NETFLIX.COM 866-579".to_string();
        let mut pinned = tx("b", (2024, 3, 1), "Netflix", 1000);
        pinned.manual_override = true;
        let mut txs = vec![by_original, pinned, tx("c", (2024, 3, 1), "Zqx Holdings", 1000)];

        assert_eq!(reclassify_all(CategoryRules::builtin(), &mut txs), 1);
        assert_eq!(txs[0].category, Category::Entertainment);
        assert_eq!(txs[1].category, Category::Other);
        assert_eq!(txs[2].category, Category::Other);
    }
}
