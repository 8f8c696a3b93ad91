//! Spending aggregates over an already-categorized transaction set.
//!
//! Expenses are transactions that are neither income nor transfers; income is
//! anything categorized `Income` or flagged as income at ingestion.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::category::Category;
use crate::money::Money;
use crate::period::Month;
use crate::transaction::Transaction;

re!(re_store_number, r"\s*#\d+");
re!(re_long_digits, r"\s*\d{4,}");
re!(re_corp_suffix, r"(?i)\s+(?:LLC|INC|CORP|LTD|CO)\b\.?");
re!(re_spaces, r"\s+");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: Month,
    pub expenses: Money,
    pub income: Money,
    /// Number of expense transactions.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: Category,
    pub total: Money,
    pub percent: f64,
    pub avg_per_month: Money,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantSummary {
    pub name: String,
    pub total: Money,
    pub count: usize,
    pub avg_per_transaction: Money,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_expenses: Money,
    pub total_income: Money,
    pub avg_monthly: Money,
    pub high_month: Option<Month>,
    pub high_amount: Money,
    pub low_month: Option<Month>,
    pub low_amount: Money,
    pub net_cash_flow: Money,
    pub num_months: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub potential_savings: Money,
    pub priority: Priority,
    /// `None` for the general tip.
    pub category: Option<Category>,
}

/// Distinct months present anywhere in the set, oldest first.
pub fn months(transactions: &[Transaction]) -> Vec<Month> {
    transactions
        .iter()
        .map(Transaction::month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn expenses(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    transactions.iter().filter(|t| t.is_expense())
}

pub fn monthly_breakdown(transactions: &[Transaction]) -> Vec<MonthlySummary> {
    let mut by_month: BTreeMap<Month, MonthlySummary> = BTreeMap::new();
    for tx in transactions {
        let month = tx.month();
        let entry = by_month.entry(month).or_insert_with(|| MonthlySummary {
            month,
            expenses: Money::zero(),
            income: Money::zero(),
            count: 0,
        });
        if tx.is_income() {
            entry.income += tx.amount;
        } else if tx.category != Category::Transfer {
            entry.expenses += tx.amount;
            entry.count += 1;
        }
    }
    by_month.into_values().collect()
}

pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let num_months = months(transactions).len().max(1);
    let mut order: Vec<Category> = Vec::new();
    let mut totals: HashMap<Category, (Money, usize)> = HashMap::new();
    for tx in expenses(transactions) {
        let entry = totals.entry(tx.category).or_insert_with(|| {
            order.push(tx.category);
            (Money::zero(), 0)
        });
        entry.0 += tx.amount;
        entry.1 += 1;
    }
    let total_spend: Money = totals.values().map(|(t, _)| *t).sum();

    let mut out: Vec<CategorySummary> = order
        .into_iter()
        .map(|category| {
            let (total, count) = totals[&category];
            CategorySummary {
                category,
                total,
                percent: total.percent_of(total_spend),
                avg_per_month: total.div_by(num_months),
                count,
            }
        })
        .collect();
    out.sort_by(|a, b| b.total.cmp(&a.total));
    out
}

/// Strips store numbers, long digit runs and corporate suffixes, then
/// capitalizes each word.
pub fn normalize_merchant_name(description: &str) -> String {
    let name = re_store_number().replace_all(description, "");
    let name = re_long_digits().replace_all(&name, "");
    let name = re_corp_suffix().replace_all(&name, "");
    let name = re_spaces().replace_all(&name, " ");
    name.trim()
        .split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn merchant_breakdown(transactions: &[Transaction]) -> Vec<MerchantSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, (Money, usize, Category)> = HashMap::new();
    for tx in expenses(transactions) {
        let name = normalize_merchant_name(&tx.description);
        let entry = by_name.entry(name.clone()).or_insert_with(|| {
            order.push(name);
            (Money::zero(), 0, tx.category)
        });
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let mut out: Vec<MerchantSummary> = order
        .into_iter()
        .map(|name| {
            let (total, count, category) = by_name[&name];
            MerchantSummary {
                avg_per_transaction: total.div_by(count),
                name,
                total,
                count,
                category,
            }
        })
        .collect();
    out.sort_by(|a, b| b.total.cmp(&a.total));
    out
}

pub fn kpis(transactions: &[Transaction]) -> Kpis {
    let monthly = monthly_breakdown(transactions);
    let total_expenses: Money = monthly.iter().map(|m| m.expenses).sum();
    let total_income: Money = monthly.iter().map(|m| m.income).sum();
    let num_months = monthly.len().max(1);

    let mut high: Option<&MonthlySummary> = None;
    let mut low: Option<&MonthlySummary> = None;
    for m in &monthly {
        if m.expenses > high.map_or(Money::zero(), |h| h.expenses) {
            high = Some(m);
        }
        if !m.expenses.is_zero() && low.map_or(true, |l| m.expenses < l.expenses) {
            low = Some(m);
        }
    }

    Kpis {
        total_expenses,
        total_income,
        avg_monthly: total_expenses.div_by(num_months),
        high_month: high.map(|m| m.month),
        high_amount: high.map_or(Money::zero(), |m| m.expenses),
        low_month: low.map(|m| m.month),
        low_amount: low.map_or(Money::zero(), |m| m.expenses),
        net_cash_flow: total_income - total_expenses,
        num_months,
    }
}

struct CategoryThreshold {
    category: Category,
    /// Percent of total spending above which the tip fires.
    min_percent: Option<f64>,
    /// Monthly average above which the tip fires.
    min_avg: Option<i64>,
    cut_percent: i64,
    priority: Priority,
    title: &'static str,
    advice: &'static str,
}

const THRESHOLDS: &[CategoryThreshold] = &[
    CategoryThreshold {
        category: Category::Dining,
        min_percent: Some(15.0),
        min_avg: None,
        cut_percent: 30,
        priority: Priority::High,
        title: "Reduce Dining Expenses",
        advice: "Consider meal prepping 2-3 times/week and limiting eating out.",
    },
    CategoryThreshold {
        category: Category::Entertainment,
        min_percent: Some(10.0),
        min_avg: None,
        cut_percent: 25,
        priority: Priority::Medium,
        title: "Cut Entertainment Costs",
        advice: "Look for free alternatives or consolidate streaming services.",
    },
    CategoryThreshold {
        category: Category::Shopping,
        min_percent: Some(20.0),
        min_avg: None,
        cut_percent: 25,
        priority: Priority::High,
        title: "Reduce Discretionary Shopping",
        advice: "Implement a 48-hour rule for non-essential purchases.",
    },
    CategoryThreshold {
        category: Category::Subscriptions,
        min_percent: None,
        min_avg: Some(100),
        cut_percent: 30,
        priority: Priority::Medium,
        title: "Audit Subscriptions",
        advice: "Review and cancel unused services, share family plans, or switch to annual billing.",
    },
    CategoryThreshold {
        category: Category::Transportation,
        min_percent: Some(15.0),
        min_avg: None,
        cut_percent: 20,
        priority: Priority::Medium,
        title: "Optimize Transportation Costs",
        advice: "Consider carpooling, public transit, or consolidating trips.",
    },
    CategoryThreshold {
        category: Category::Groceries,
        min_percent: None,
        min_avg: Some(800),
        cut_percent: 15,
        priority: Priority::Low,
        title: "Optimize Grocery Spending",
        advice: "Try meal planning, store brands, and discount grocers.",
    },
];

fn percent_factor(p: i64) -> Decimal {
    Decimal::new(p, 2)
}

pub fn savings_recommendations(transactions: &[Transaction]) -> Vec<Recommendation> {
    let breakdown = category_breakdown(transactions);
    let summary = kpis(transactions);
    let mut recs = Vec::new();

    for cat in &breakdown {
        for t in THRESHOLDS.iter().filter(|t| t.category == cat.category) {
            let fires = t.min_percent.is_some_and(|p| cat.percent > p)
                || t.min_avg.is_some_and(|a| cat.avg_per_month > Money::from_cents(a * 100));
            if !fires {
                continue;
            }
            let savings = cat.avg_per_month.scale(percent_factor(t.cut_percent));
            recs.push(Recommendation {
                title: t.title.to_string(),
                description: format!(
                    "{} is {:.1}% of spending (${:.0}/mo). {} A {}% reduction saves ~${:.0}/mo.",
                    cat.category,
                    cat.percent,
                    cat.avg_per_month.to_f64(),
                    t.advice,
                    t.cut_percent,
                    savings.to_f64(),
                ),
                potential_savings: savings,
                priority: t.priority,
                category: Some(cat.category),
            });
        }
    }

    let habit = merchant_breakdown(transactions).into_iter().find(|m| {
        m.count >= 10 && m.avg_per_transaction < Money::from_cents(1500) && m.total > Money::from_cents(5000)
    });
    if let Some(m) = habit {
        let savings = m.total.div_by(summary.num_months).scale(percent_factor(50));
        recs.push(Recommendation {
            title: "Reduce Frequent Small Purchases".to_string(),
            description: format!(
                "You visited \"{}\" {} times (avg {}/visit). Cutting frequency by 50% saves ~${:.0}/mo.",
                m.name,
                m.count,
                m.avg_per_transaction,
                savings.to_f64(),
            ),
            potential_savings: savings,
            priority: Priority::Low,
            category: Some(m.category),
        });
    }

    if recs.is_empty() && !summary.total_expenses.is_zero() {
        let savings = summary.avg_monthly.scale(percent_factor(10));
        recs.push(Recommendation {
            title: "General Savings Tip".to_string(),
            description: format!(
                "Spending looks balanced. Try the 50/30/20 rule and target saving ${:.0}/mo (10% reduction).",
                savings.to_f64(),
            ),
            potential_savings: savings,
            priority: Priority::Low,
            category: None,
        });
    }

    recs.sort_by(|a, b| b.potential_savings.cmp(&a.potential_savings));
    recs
}
