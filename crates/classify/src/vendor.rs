use serde::{Deserialize, Serialize};
use spendlens_core::category::Category;
use spendlens_core::re;
use spendlens_core::transaction::Transaction;
use spendlens_import::merchants::MerchantTable;

use crate::address::strip_address;

re!(re_hash_number, r"\s*#\d+");
re!(re_store_number, r"(?i)\b(?:store|ste|suite|unit|loc|location)\s*#?\d+");
re!(re_long_code, r"\s+\d{6,}\s*$");
re!(re_spaces, r"\s{2,}");

/// Canonical lowercase vendor name. A resolved merchant wins; otherwise
/// store numbers and address tails are dropped and the rest is folded
/// through the merchant table.
pub fn normalize_vendor_key(tx: &Transaction) -> String {
    if let Some(merchant) = tx.merchant.as_deref().filter(|m| !m.trim().is_empty()) {
        return merchant.trim().to_lowercase();
    }

    let name = match tx.description.trim() {
        "" => tx.original_description.trim(),
        d => d,
    };
    if name.is_empty() {
        return String::new();
    }

    let name = re_hash_number().replace_all(name, "");
    let name = re_store_number().replace_all(&name, "");
    let name = strip_address(&name);
    let name = re_long_code().replace(&name, "");
    let name = re_spaces().replace_all(name.trim(), " ").trim().to_lowercase();

    match MerchantTable::shared().resolve(&name) {
        Some(resolved) => resolved.to_lowercase(),
        None => name,
    }
}

/// Grouping key, or `None` when too short to mean anything.
pub fn vendor_key(tx: &Transaction) -> Option<String> {
    let key = normalize_vendor_key(tx);
    (key.chars().count() >= 2).then_some(key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorGroup {
    pub vendor_key: String,
    /// Merchant or description of the first transaction seen.
    pub name: String,
    /// Most frequent category among the classified members.
    pub dominant_category: Option<Category>,
    pub classified_count: usize,
    pub unclassified_count: usize,
    pub unclassified: Vec<Transaction>,
}

impl VendorGroup {
    pub fn is_actionable(&self) -> bool {
        self.classified_count > 0 && self.unclassified_count > 0
    }
}

/// All vendor groups in first-seen order.
pub fn vendor_groups(all: &[Transaction]) -> Vec<VendorGroup> {
    struct Building<'a> {
        key: String,
        name: String,
        classified: Vec<Category>,
        unclassified: Vec<&'a Transaction>,
    }

    let mut groups: Vec<Building> = Vec::new();
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for tx in all {
        let Some(key) = vendor_key(tx) else {
            continue;
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Building {
                key,
                name: display_name(tx).to_string(),
                classified: Vec::new(),
                unclassified: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        if tx.category.is_other() {
            group.unclassified.push(tx);
        } else {
            group.classified.push(tx.category);
        }
    }

    groups
        .into_iter()
        .map(|g| VendorGroup {
            dominant_category: dominant(&g.classified),
            classified_count: g.classified.len(),
            unclassified_count: g.unclassified.len(),
            unclassified: g.unclassified.into_iter().cloned().collect(),
            vendor_key: g.key,
            name: g.name,
        })
        .collect()
}

/// Groups with at least one classified and one unclassified member, most
/// unclassified first.
pub fn actionable_vendor_groups(all: &[Transaction]) -> Vec<VendorGroup> {
    let mut groups: Vec<VendorGroup> = vendor_groups(all)
        .into_iter()
        .filter(VendorGroup::is_actionable)
        .collect();
    groups.sort_by(|a, b| b.unclassified_count.cmp(&a.unclassified_count));
    groups
}

/// Sets `category` on every unclassified, non-overridden transaction with
/// this vendor key. Returns how many changed.
pub fn apply_vendor_category(txs: &mut [Transaction], key: &str, category: Category) -> usize {
    let mut count = 0;
    for tx in txs.iter_mut().filter(|t| is_propagation_target(t)) {
        if vendor_key(tx).as_deref() == Some(key) {
            tx.category = category;
            count += 1;
        }
    }
    count
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorApplyDetail {
    pub name: String,
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorApplySummary {
    pub total_updated: usize,
    pub groups_applied: usize,
    pub details: Vec<VendorApplyDetail>,
}

/// Applies each actionable group's dominant category to its unclassified members.
pub fn apply_all_vendor_categories(txs: &mut [Transaction]) -> VendorApplySummary {
    let mut summary = VendorApplySummary::default();
    for group in actionable_vendor_groups(txs) {
        let Some(category) = group.dominant_category else {
            continue;
        };
        let count = apply_vendor_category(txs, &group.vendor_key, category);
        if count > 0 {
            summary.total_updated += count;
            summary.details.push(VendorApplyDetail {
                name: group.name,
                category,
                count,
            });
        }
    }
    summary.groups_applied = summary.details.len();
    if summary.total_updated > 0 {
        tracing::info!(
            updated = summary.total_updated,
            groups = summary.groups_applied,
            "applied vendor categories"
        );
    }
    summary
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSiblings {
    pub vendor_key: String,
    pub vendor_name: String,
    pub siblings: Vec<Transaction>,
}

/// Other unclassified transactions from the same vendor as `id`, or `None`
/// when there are none.
pub fn find_vendor_siblings(all: &[Transaction], id: &str) -> Option<VendorSiblings> {
    let tx = all.iter().find(|t| t.id == id)?;
    let key = vendor_key(tx)?;
    let siblings: Vec<Transaction> = all
        .iter()
        .filter(|t| t.id != id && is_propagation_target(t))
        .filter(|t| vendor_key(t).as_deref() == Some(key.as_str()))
        .cloned()
        .collect();
    if siblings.is_empty() {
        return None;
    }
    Some(VendorSiblings {
        vendor_key: key,
        vendor_name: display_name(tx).to_string(),
        siblings,
    })
}

fn is_propagation_target(tx: &Transaction) -> bool {
    tx.category.is_other() && !tx.manual_override
}

fn display_name(tx: &Transaction) -> &str {
    tx.merchant.as_deref().unwrap_or(&tx.description)
}

/// Most frequent; the first one seen wins a tie.
fn dominant(categories: &[Category]) -> Option<Category> {
    let mut counts: Vec<(Category, usize)> = Vec::new();
    for &c in categories {
        match counts.iter_mut().find(|(k, _)| *k == c) {
            Some((_, n)) => *n += 1,
            None => counts.push((c, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None::<(Category, usize)>, |best, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(c, _)| c)
}
