use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::money::Money;
use spendlens_core::rules::CategoryRules;
use spendlens_core::transaction::{LedgerError, Transaction};
use std::collections::HashSet;

use crate::classifier::days_between;

const TRANSFER_KEYWORDS: &[&str] = &[
    "transfer", "xfer", "zelle", "venmo", "paypal", "cash app", "wire", "autopay", "auto pay",
    "bill pay", "billpay", "payment", "online transfer", "e-payment", "epay",
];

const BASE_CONFIDENCE: u32 = 50;
const KEYWORD_BOOST: u32 = 15;
const ALREADY_TRANSFER_BOOST: u32 = 10;

/// A candidate internal transfer: `tx1` is the outflow, `tx2` the inflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPair {
    pub tx1: Transaction,
    pub tx2: Transaction,
    pub confidence: u32,
    pub reason: String,
    pub amount: Money,
}

/// Finds expense/income pairs across accounts with the same amount a few
/// days apart.
///
/// Matching is greedy: each expense takes the first eligible income in set
/// order and both are then used up. This is not an optimal assignment.
#[derive(Debug, Clone)]
pub struct TransferDetector {
    pub date_window_days: i64,
    pub amount_tolerance_cents: i64,
}

impl Default for TransferDetector {
    fn default() -> Self {
        Self {
            date_window_days: 3,
            amount_tolerance_cents: 0,
        }
    }
}

impl TransferDetector {
    pub fn new(date_window_days: i64, amount_tolerance_cents: i64) -> Self {
        Self {
            date_window_days,
            amount_tolerance_cents,
        }
    }

    /// Candidates sorted by descending confidence. Transactions already in a
    /// confirmed pair are not considered.
    pub fn detect(&self, all: &[Transaction]) -> Vec<TransferPair> {
        let open: Vec<&Transaction> = all.iter().filter(|t| t.transfer_pair_id.is_none()).collect();
        let expenses: Vec<&Transaction> = open.iter().copied().filter(|t| !t.is_income()).collect();
        let incomes: Vec<&Transaction> = open.iter().copied().filter(|t| t.is_income()).collect();

        let mut used: HashSet<&str> = HashSet::new();
        let mut pairs = Vec::new();
        for expense in &expenses {
            if used.contains(expense.id.as_str()) {
                continue;
            }
            let found = incomes
                .iter()
                .filter(|income| !used.contains(income.id.as_str()))
                .find_map(|income| self.score(expense, income).map(|scored| (income, scored)));
            if let Some((income, (confidence, reason))) = found {
                used.insert(expense.id.as_str());
                used.insert(income.id.as_str());
                pairs.push(TransferPair {
                    tx1: (*expense).clone(),
                    tx2: (*income).clone(),
                    confidence,
                    reason,
                    amount: expense.amount,
                });
            }
        }

        pairs.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        tracing::debug!(candidates = pairs.len(), "transfer scan finished");
        pairs
    }

    /// `None` when the pair fails a hard filter.
    fn score(&self, expense: &Transaction, income: &Transaction) -> Option<(u32, String)> {
        if expense.account == income.account {
            return None;
        }
        let diff = (expense.amount.to_cents() - income.amount.to_cents()).abs();
        if diff > self.amount_tolerance_cents {
            return None;
        }
        let days = days_between(expense.date, income.date);
        if days > self.date_window_days {
            return None;
        }

        let (date_boost, distance) = match days {
            0 => (20, "same day".to_string()),
            1 => (15, "1 day apart".to_string()),
            2 => (10, "2 days apart".to_string()),
            n => (5, format!("{n} days apart")),
        };
        let mut confidence = BASE_CONFIDENCE + date_boost;
        let mut reason = format!(
            "Same amount {}, {distance}, {} → {}",
            expense.amount, expense.account, income.account
        );
        if has_transfer_keyword(expense) || has_transfer_keyword(income) {
            confidence += KEYWORD_BOOST;
            reason.push_str(", transfer keyword");
        }
        if expense.category == Category::Transfer || income.category == Category::Transfer {
            confidence += ALREADY_TRANSFER_BOOST;
            reason.push_str(", already categorized as Transfer");
        }
        Some((confidence.min(100), reason))
    }
}

fn has_transfer_keyword(tx: &Transaction) -> bool {
    let desc = tx.description.to_lowercase();
    let original = tx.original_description.to_lowercase();
    TRANSFER_KEYWORDS
        .iter()
        .any(|kw| desc.contains(kw) || original.contains(kw))
}

/// Links two transactions as one transfer. Both become `Transfer`.
pub fn mark_transfer_pair(txs: &mut [Transaction], id1: &str, id2: &str) -> Result<String, LedgerError> {
    if id1 == id2 {
        return Err(LedgerError::SelfTransfer(id1.to_string()));
    }
    let i1 = position(txs, id1)?;
    let i2 = position(txs, id2)?;
    for i in [i1, i2] {
        if txs[i].transfer_pair_id.is_some() {
            return Err(LedgerError::AlreadyPaired(txs[i].id.clone()));
        }
    }

    let link = uuid::Uuid::new_v4().to_string();
    for i in [i1, i2] {
        txs[i].transfer_pair_id = Some(link.clone());
        txs[i].category = Category::Transfer;
    }
    Ok(link)
}

/// Dissolves a link; each member goes back to its keyword category.
pub fn unmark_transfer_pair(
    txs: &mut [Transaction],
    link_id: &str,
    rules: &CategoryRules,
) -> Result<usize, LedgerError> {
    let mut count = 0;
    for tx in txs
        .iter_mut()
        .filter(|t| t.transfer_pair_id.as_deref() == Some(link_id))
    {
        tx.category = rules.auto_category(&tx.description);
        tx.transfer_pair_id = None;
        count += 1;
    }
    if count == 0 {
        return Err(LedgerError::TransferPairNotFound(link_id.to_string()));
    }
    Ok(count)
}

fn position(txs: &[Transaction], id: &str) -> Result<usize, LedgerError> {
    txs.iter()
        .position(|t| t.id == id)
        .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedTransfer {
    pub link_id: String,
    pub tx1: Transaction,
    pub tx2: Transaction,
    pub amount: Money,
}

/// Linked pairs in first-seen order. The inflow side, when flagged, is `tx2`.
pub fn confirmed_transfers(all: &[Transaction]) -> Vec<ConfirmedTransfer> {
    let mut links: Vec<(&str, Vec<&Transaction>)> = Vec::new();
    for tx in all {
        let Some(link) = tx.transfer_pair_id.as_deref() else {
            continue;
        };
        match links.iter_mut().find(|(l, _)| *l == link) {
            Some((_, members)) => members.push(tx),
            None => links.push((link, vec![tx])),
        }
    }

    links
        .into_iter()
        .filter_map(|(link, members)| match members.as_slice() {
            [a, b] => {
                let (out, inflow) = if a.is_income && !b.is_income { (b, a) } else { (a, b) };
                Some(ConfirmedTransfer {
                    link_id: link.to_string(),
                    tx1: (*out).clone(),
                    tx2: (*inflow).clone(),
                    amount: out.amount,
                })
            }
            _ => {
                tracing::warn!(link, members = members.len(), "transfer link without exactly two members");
                None
            }
        })
        .collect()
}
