use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::transaction::Transaction;

use crate::classifier::days_between;

const MAX_NEARBY: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// What surrounds a transaction, for a person deciding its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionContext {
    pub day_of_week: String,
    pub is_weekday: bool,
    pub amount: Money,
    /// Same day or one day either side, oldest first.
    pub nearby: Vec<Transaction>,
    /// Categorized neighbors only, in first-seen order.
    pub nearby_categories: Vec<CategoryCount>,
    pub top_nearby_category: Option<Category>,
    pub clues: Vec<String>,
}

pub fn transaction_context(tx: &Transaction, all: &[Transaction]) -> TransactionContext {
    let mut nearby: Vec<&Transaction> = all
        .iter()
        .filter(|t| t.id != tx.id && days_between(t.date, tx.date) <= 1)
        .collect();
    nearby.sort_by_key(|t| t.date);

    let mut counts: Vec<CategoryCount> = Vec::new();
    for n in nearby.iter().filter(|n| !n.category.is_other()) {
        match counts.iter_mut().find(|c| c.category == n.category) {
            Some(c) => c.count += 1,
            None => counts.push(CategoryCount { category: n.category, count: 1 }),
        }
    }
    let count_of = |cat: Category| counts.iter().find(|c| c.category == cat).map_or(0, |c| c.count);

    let weekday = tx.date.weekday();
    let is_weekday = !matches!(weekday, Weekday::Sat | Weekday::Sun);
    let day_of_week = day_name(weekday).to_string();
    let amount = tx.amount;
    let between = |lo: i64, hi: i64| amount >= Money::from_cents(lo) && amount <= Money::from_cents(hi);

    let mut clues = vec![
        format!("Transaction on {day_of_week} ({})", tx.date),
        format!("Amount: {amount}"),
    ];
    if is_weekday && between(800, 2500) {
        clues.push("Weekday with a typical lunch amount, could be a dining expense".to_string());
    }
    if !is_weekday && between(3000, 10000) {
        clues.push("Weekend with a moderate amount, could be dining or entertainment".to_string());
    }
    let travel = count_of(Category::Travel);
    if travel >= 2 {
        clues.push(format!("{travel} travel transactions nearby, possibly part of a trip"));
    }
    let dining = count_of(Category::Dining);
    if dining >= 2 {
        clues.push(format!("{dining} dining transactions nearby, a pattern of eating out"));
    }

    // highest count; first seen wins a tie
    let top_nearby_category = counts
        .iter()
        .fold(None::<&CategoryCount>, |best, c| match best {
            Some(b) if b.count >= c.count => Some(b),
            _ => Some(c),
        })
        .map(|c| c.category);

    TransactionContext {
        day_of_week,
        is_weekday,
        amount,
        nearby: nearby.into_iter().take(MAX_NEARBY).cloned().collect(),
        nearby_categories: counts,
        top_nearby_category,
        clues,
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
