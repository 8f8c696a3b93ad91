//! Street address fragments inside statement descriptions.

use serde::{Deserialize, Serialize};
use spendlens_core::re;
use spendlens_core::transaction::Transaction;
use spendlens_import::normalize::US_STATES;

const STREET_SUFFIXES: &str = "St|Street|Ave|Avenue|Blvd|Boulevard|Dr|Drive|Rd|Road|Ln|Lane|Way|Ct|Court|Pl|Place|Cir|Circle|Pkwy|Parkway|Hwy|Highway|Pike|Ter|Terrace|Trail|Trl";

re!(re_street, &format!(r"(?i)\b\d{{1,5}}\s+[A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*\s+(?:{STREET_SUFFIXES})\b"));
re!(re_street_tail, &format!(r"(?i)\s+\d{{1,5}}\s+[A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*\s+(?:{STREET_SUFFIXES})\b.*"));
re!(re_city_state, &format!(r"\b[A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+){{0,2}},?\s+(?:{})\b", US_STATES.join("|")));
re!(re_state_tail, &format!(r"(?i)(?:,\s*|\s+)(?:{})(?:\s+\d{{5}}(?:-\d{{4}})?)?\s*$", US_STATES.join("|")));
re!(re_zip, r"\b\d{5}(?:-\d{4})?\b");
re!(re_unit, r"(?i)(?:\bSuite|\bSte|\bApt|\bUnit|#)\s*\d+");
re!(re_trailing_zip, r"\s+\d{5}(?:-\d{4})?\s*$");
re!(re_spaces, r"\s{2,}");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMatch {
    /// Every matched address fragment, comma-joined.
    pub address_text: String,
    /// Description with the address removed.
    pub business_name: String,
}

/// Looks for a street, `City ST`, ZIP or unit number in the original and
/// display text.
pub fn detect_address(tx: &Transaction) -> Option<AddressMatch> {
    let combined = format!("{} {}", tx.source_text(), tx.description);
    let parts: Vec<&str> = [re_street(), re_city_state(), re_zip(), re_unit()]
        .into_iter()
        .filter_map(|re| re.find(&combined))
        .map(|m| m.as_str().trim())
        .collect();
    if parts.is_empty() {
        return None;
    }

    let base = if tx.description.trim().is_empty() {
        tx.source_text()
    } else {
        tx.description.as_str()
    };
    let mut business_name = strip_address(base);
    if business_name.chars().count() < 2 {
        business_name = base.trim().to_string();
    }

    Some(AddressMatch {
        address_text: parts.join(", "),
        business_name,
    })
}

/// Removes a street tail, a trailing state (with optional ZIP) and a trailing ZIP.
pub(crate) fn strip_address(text: &str) -> String {
    let s = re_street_tail().replace(text, "");
    let s = re_state_tail().replace(s.trim(), "");
    let s = re_trailing_zip().replace(s.trim(), "");
    re_spaces().replace_all(s.trim(), " ").trim().to_string()
}
