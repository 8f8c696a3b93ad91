#[doc(hidden)]
pub use regex as __regex;

/// Declares a function returning a lazily compiled, process-wide `Regex`.
#[macro_export]
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static $crate::__regex::Regex {
            static R: std::sync::OnceLock<$crate::__regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| $crate::__regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod analysis;
pub mod budget;
pub mod category;
pub mod money;
pub mod period;
pub mod rules;
pub mod transaction;

pub use analysis::{CategorySummary, Kpis, MerchantSummary, MonthlySummary, Priority, Recommendation};
pub use budget::{Budget, BudgetComparison, BudgetEntry, BudgetStatus};
pub use category::{Category, TransactionType};
pub use money::Money;
pub use period::{DateRange, Month};
pub use rules::{CategoryRules, PatternOutcome, RuleError, RuleOverrides, RuleTable};
pub use transaction::{LedgerError, NewTransaction, Transaction, TransactionFilter, TransactionPatch, UNKNOWN};
