use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

use crate::category::{Category, CATEGORY_KEYWORDS, PATTERN_RULES};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid rule pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("Failed to parse rules TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Internal pairing of an outcome with its precompiled, case-insensitive regex.
struct CompiledRule<O> {
    regex: Regex,
    outcome: O,
}

/// Ordered table of (matcher, outcome) entries. Evaluation order is table order.
pub struct RuleTable<O> {
    rules: Vec<CompiledRule<O>>,
}

impl<O> RuleTable<O> {
    pub fn new<P, I>(entries: I) -> Result<Self, regex::Error>
    where
        P: AsRef<str>,
        I: IntoIterator<Item = (P, O)>,
    {
        let rules = entries
            .into_iter()
            .map(|(pattern, outcome)| -> Result<CompiledRule<O>, regex::Error> {
                let regex = RegexBuilder::new(pattern.as_ref())
                    .case_insensitive(true)
                    .build()?;
                Ok(CompiledRule { regex, outcome })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn first_match(&self, text: &str) -> Option<&O> {
        self.rules
            .iter()
            .find(|r| r.regex.is_match(text))
            .map(|r| &r.outcome)
    }

    /// Every rule matching any of `texts`, once per rule, in table order.
    pub fn matches<'a>(&'a self, texts: &'a [&'a str]) -> impl Iterator<Item = &'a O> + 'a {
        self.rules
            .iter()
            .filter(move |r| texts.iter().any(|t| r.regex.is_match(t)))
            .map(|r| &r.outcome)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternOutcome {
    pub category: Category,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub category: Category,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// User additions on top of the built-in tables, loaded from the `[rules]`
/// section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleOverrides {
    #[serde(default)]
    pub keywords: Vec<KeywordRule>,
    #[serde(default)]
    pub patterns: Vec<PatternRule>,
}

/// Keyword lists per category plus the curated pattern rules.
pub struct CategoryRules {
    keywords: Vec<(Category, Vec<String>)>,
    patterns: RuleTable<PatternOutcome>,
}

impl CategoryRules {
    /// The built-in tables, compiled once.
    pub fn builtin() -> &'static CategoryRules {
        static RULES: OnceLock<CategoryRules> = OnceLock::new();
        RULES.get_or_init(|| {
            CategoryRules::with_overrides(RuleOverrides::default()).expect("invalid built-in rule")
        })
    }

    pub fn with_overrides(overrides: RuleOverrides) -> Result<Self, RuleError> {
        let mut keywords: Vec<(Category, Vec<String>)> = CATEGORY_KEYWORDS
            .iter()
            .map(|(cat, kws)| (*cat, kws.iter().map(|k| k.to_string()).collect()))
            .collect();
        for extra in overrides.keywords {
            let lowered = extra.keywords.iter().map(|k| k.to_lowercase());
            match keywords.iter_mut().find(|(c, _)| *c == extra.category) {
                Some((_, list)) => list.extend(lowered),
                None => keywords.push((extra.category, lowered.collect())),
            }
        }

        let builtin = PATTERN_RULES.iter().map(|(pattern, category, reason)| {
            (
                pattern.to_string(),
                PatternOutcome { category: *category, reason: reason.to_string() },
            )
        });
        let custom = overrides.patterns.into_iter().map(|r| {
            (r.pattern, PatternOutcome { category: r.category, reason: r.reason })
        });
        let patterns = RuleTable::new(builtin.chain(custom))?;

        Ok(Self { keywords, patterns })
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        let overrides: RuleOverrides = toml::from_str(toml_content)?;
        Self::with_overrides(overrides)
    }

    /// Baseline categorization: first keyword contained in the lowercased
    /// text, in table order, else `Other`.
    pub fn auto_category(&self, text: &str) -> Category {
        self.first_keyword_match(text)
            .map(|(cat, _)| cat)
            .unwrap_or(Category::Other)
    }

    /// Keeps `current` unless it is `Other`.
    pub fn recategorize(&self, text: &str, current: Category) -> Category {
        if current.is_other() {
            self.auto_category(text)
        } else {
            current
        }
    }

    pub fn first_keyword_match(&self, text: &str) -> Option<(Category, &str)> {
        let lower = text.to_lowercase();
        self.keywords.iter().find_map(|(cat, kws)| {
            kws.iter()
                .find(|kw| lower.contains(kw.as_str()))
                .map(|kw| (*cat, kw.as_str()))
        })
    }

    /// First matching keyword per category across the given (lowercased)
    /// texts, in table order.
    pub fn keyword_hits<'a>(&'a self, texts: &[&str]) -> Vec<(Category, &'a str)> {
        self.keywords
            .iter()
            .filter_map(|(cat, kws)| {
                kws.iter()
                    .find(|kw| {
                        let kw = kw.trim();
                        texts.iter().any(|t| t.contains(kw))
                    })
                    .map(|kw| (*cat, kw.as_str()))
            })
            .collect()
    }

    pub fn pattern_hits<'a>(&'a self, texts: &'a [&'a str]) -> Vec<&'a PatternOutcome> {
        self.patterns.matches(texts).collect()
    }

    pub fn first_pattern(&self, text: &str) -> Option<&PatternOutcome> {
        self.patterns.first_match(text)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_first_match_respects_order() {
        let table = RuleTable::new([(r"^pos\b", "pos"), (r"^pos debit", "pos-debit")]).unwrap();
        assert_eq!(table.first_match("POS DEBIT 123"), Some(&"pos"));
        assert_eq!(table.first_match("ATM"), None);
    }

    #[test]
    fn rule_table_matches_each_rule_once() {
        let table = RuleTable::new([(r"\bpub\b", 1), (r"\bgrill\b", 2), (r"\bbar\b", 3)]).unwrap();
        let texts = ["joe's pub", "JOE'S PUB & GRILL"];
        let hits: Vec<_> = table.matches(&texts).copied().collect();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn rule_table_rejects_bad_pattern() {
        assert!(RuleTable::new([(r"(unclosed", ())]).is_err());
    }

    #[test]
    fn auto_category_uses_table_order() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.auto_category("Monthly RENT payment"), Category::Housing);
        assert_eq!(rules.auto_category("WALMART SUPERCENTER"), Category::Groceries);
        assert_eq!(rules.auto_category("Shell"), Category::Transportation);
        assert_eq!(rules.auto_category("Zelle to Sam"), Category::Transfer);
        assert_eq!(rules.auto_category("Joe's Pub"), Category::Other);
    }

    #[test]
    fn recategorize_keeps_existing_category() {
        let rules = CategoryRules::builtin();
        assert_eq!(rules.recategorize("Netflix", Category::Shopping), Category::Shopping);
        assert_eq!(rules.recategorize("Netflix", Category::Other), Category::Entertainment);
    }

    #[test]
    fn keyword_hits_one_per_category() {
        let rules = CategoryRules::builtin();
        let hits = rules.keyword_hits(&["starbucks coffee"]);
        assert_eq!(hits, vec![(Category::Dining, "starbucks")]);
    }

    #[test]
    fn pattern_hits_collect_reasons() {
        let rules = CategoryRules::builtin();
        let texts = ["joe's pub"];
        let hits = rules.pattern_hits(&texts);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, Category::Dining);
        assert!(hits[0].reason.contains("pub"));
    }

    #[test]
    fn overrides_extend_builtin_tables() {
        let rules = CategoryRules::from_toml(
            r#"
            [[keywords]]
            category = "Education"
            keywords = ["Kumon"]

            [[patterns]]
            pattern = '\bdojo\b'
            category = "Personal Care"
            reason = "dojo, martial arts studio"
            "#,
        )
        .unwrap();
        assert_eq!(rules.auto_category("KUMON CENTER"), Category::Education);
        assert_eq!(rules.first_pattern("tiger dojo").unwrap().category, Category::PersonalCare);
        assert_eq!(rules.pattern_count(), CategoryRules::builtin().pattern_count() + 1);
    }
}
