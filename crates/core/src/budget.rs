use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::{self, CategorySummary};
use crate::category::Category;
use crate::money::Money;
use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEntry {
    #[serde(default)]
    pub target: Money,
    #[serde(default)]
    pub avg_spend: Money,
}

/// Monthly spending targets keyed by category. Persisted separately from the
/// transaction set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Budget(BTreeMap<Category, BudgetEntry>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetStatus {
    OnTrack,
    OverBudget,
    /// No target set.
    Unset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetComparison {
    pub category: Category,
    pub avg_per_month: Money,
    pub target: Money,
    /// `target - avg_per_month`; negative means over budget.
    pub difference: Money,
    pub status: BudgetStatus,
}

impl Budget {
    /// Targets at `reduction_percent` below each spending category's monthly
    /// average.
    pub fn auto_generate(breakdown: &[CategorySummary], reduction_percent: Decimal) -> Self {
        let factor = Decimal::ONE - reduction_percent / Decimal::ONE_HUNDRED;
        let entries = breakdown
            .iter()
            .filter(|c| c.category.is_spending())
            .map(|c| {
                (
                    c.category,
                    BudgetEntry {
                        target: c.avg_per_month.scale(factor),
                        avg_spend: c.avg_per_month,
                    },
                )
            })
            .collect();
        Budget(entries)
    }

    pub fn get(&self, category: Category) -> Option<&BudgetEntry> {
        self.0.get(&category)
    }

    /// Sets a target, keeping any recorded average.
    pub fn set_target(&mut self, category: Category, target: Money) {
        self.0.entry(category).or_default().target = target.abs();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &BudgetEntry)> {
        self.0.iter().map(|(c, e)| (*c, e))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn compare(&self, breakdown: &[CategorySummary]) -> Vec<BudgetComparison> {
        breakdown
            .iter()
            .filter(|c| c.category.is_spending())
            .map(|c| {
                let target = self.get(c.category).map_or(Money::zero(), |e| e.target);
                let status = if target.is_zero() {
                    BudgetStatus::Unset
                } else if c.avg_per_month <= target {
                    BudgetStatus::OnTrack
                } else {
                    BudgetStatus::OverBudget
                };
                BudgetComparison {
                    category: c.category,
                    avg_per_month: c.avg_per_month,
                    target,
                    difference: target - c.avg_per_month,
                    status,
                }
            })
            .collect()
    }

    /// Actual spending in the most recent month for every category with a
    /// non-zero target, paired as `(category, target, actual)`.
    pub fn latest_month_actuals(&self, transactions: &[Transaction]) -> Vec<(Category, Money, Money)> {
        let Some(latest) = analysis::months(transactions).pop() else {
            return Vec::new();
        };
        let mut actuals: BTreeMap<Category, Money> = BTreeMap::new();
        for tx in analysis::expenses(transactions).filter(|t| latest.contains(t.date)) {
            *actuals.entry(tx.category).or_default() += tx.amount;
        }
        self.iter()
            .filter(|(_, e)| !e.target.is_zero())
            .map(|(c, e)| (c, e.target, actuals.get(&c).copied().unwrap_or_default()))
            .collect()
    }
}
