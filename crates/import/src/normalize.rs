//! Statement description cleanup: bank jargon, reference numbers and
//! location tails are stripped, truncated merchant codes resolved.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use spendlens_core::category::TransactionType;
use spendlens_core::re;
use spendlens_core::rules::RuleTable;
use std::sync::OnceLock;

use crate::merchants::MerchantTable;

pub const UNKNOWN_TRANSACTION: &str = "Unknown Transaction";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanedDescription {
    pub cleaned: String,
    pub merchant: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub original: String,
}

// ── Pattern tables ────────────────────────────────────────────────────────────

/// Leading signatures naming the payment mechanism. First match wins.
const MECHANISMS: &[(&str, TransactionType)] = &[
    (r"^POS\b|^POINT\s+OF\s+SALE", TransactionType::Pos),
    (r"^DEBIT|^CHK?\s*CRD|^CHECK\s*CARD", TransactionType::Debit),
    (r"^CREDIT", TransactionType::Credit),
    (r"^ACH", TransactionType::Ach),
    (r"^ATM", TransactionType::Atm),
    (r"^WIRE", TransactionType::Wire),
    (r"^EFT|^ELECTRONIC", TransactionType::Eft),
    (r"^RECURRING|^AUTO\s*PAY|^AUTOPAY", TransactionType::Recurring),
    (r"^BILL\s*PAY", TransactionType::BillPay),
    (r"^MOBILE\s+PAY|^CONTACTLESS|^TAP\s+TO", TransactionType::MobilePay),
    (r"^ONLINE", TransactionType::Online),
    (r"^DEPOSIT|^DIRECT\s+DEPOSIT", TransactionType::Deposit),
    (r"^WITHDRAWAL", TransactionType::Withdrawal),
];

/// Applied in order, each once. Case-insensitive.
const PREFIXES: &[&str] = &[
    // debit
    r"^POS\s+DEBIT\s+VISA\s+DDA\s*",
    r"^POS\s+DEBIT\s+VISA\s*",
    r"^POS\s+DEBIT\s+MC\s+DDA\s*",
    r"^POS\s+DEBIT\s+MC\s*",
    r"^POS\s+DEBIT\s*",
    r"^POS\s+PURCHASE\s*",
    r"^POS\s+WITHDRAWAL\s*",
    r"^POS\s+REFUND\s*",
    r"^POS\s+RETURN\s*",
    r"^POS\s*",
    r"^DEBIT\s+CARD\s+PURCHASE\s*",
    r"^DEBIT\s+CARD\s+REFUND\s*",
    r"^DEBIT\s+PURCHASE\s*",
    r"^DEBIT\s*",
    r"^CHECK\s+CARD\s+PURCHASE\s*",
    r"^CHECK\s+CARD\s*",
    r"^CHECKCARD\s*",
    r"^CHK\s+CRD\s*",
    // ach
    r"^ACH\s+DEBIT\s*",
    r"^ACH\s+CREDIT\s*",
    r"^ACH\s+PAYMENT\s*",
    r"^ACH\s+DEPOSIT\s*",
    r"^ACH\s+WITHDRAWAL\s*",
    r"^ACH\s+TRANSACTION\s*",
    r"^ACH\s*",
    r"^ELECTRONIC\s+ACH\s*",
    // recurring
    r"^RECURRING\s+DEBIT\s*",
    r"^RECURRING\s+PAYMENT\s*",
    r"^RECURRING\s+CHECK\s+CARD\s*",
    r"^RECURRING\s*",
    r"^AUTO\s+PAY\s*",
    r"^AUTOPAY\s*",
    r"^AUTOMATIC\s+PAYMENT\s*",
    // credit / deposit
    r"^CREDIT\s+CARD\s+CREDIT\s*",
    r"^CREDIT\s+MEMO\s*",
    r"^CREDIT\s*",
    r"^DEPOSIT\s*",
    r"^DIRECT\s+DEPOSIT\s*",
    // wire / eft
    r"^WIRE\s+TRANSFER\s*",
    r"^WIRE\s+IN\s*",
    r"^WIRE\s+OUT\s*",
    r"^EFT\s+DEBIT\s*",
    r"^EFT\s+CREDIT\s*",
    r"^EFT\s*",
    r"^ELECTRONIC\s+PAYMENT\s*",
    r"^ELECTRONIC\s+DEBIT\s*",
    r"^E-PAYMENT\s*",
    // card networks
    r"^VISA\s+DDA\s+PUR\s*",
    r"^VISA\s+DDA\s*",
    r"^VISA\s+CHECK\s+CARD\s*",
    r"^VISA\s*",
    r"^MASTERCARD\s*",
    r"^DISCOVER\s*",
    r"^AMEX\s*",
    // purchase / payment
    r"^PURCHASE\s+AUTHORIZED\s+ON\s+\d{2}/\d{2}\s*",
    r"^PURCHASE\s+AUTHORIZED\s+ON\s*",
    r"^PURCHASE\s*",
    r"^PAYMENT\s+TO\s*",
    r"^PAYMENT\s+SENT\s*",
    r"^PAYMENT\s*",
    r"^ONLINE\s+PAYMENT\s*",
    r"^ONLINE\s+PURCHASE\s*",
    r"^ONLINE\s+TRANSFER\s*",
    r"^BILL\s+PAYMENT\s*",
    r"^BILLPAY\s*",
    // atm / withdrawal
    r"^ATM\s+WITHDRAWAL\s*",
    r"^ATM\s+DEPOSIT\s*",
    r"^ATM\s*",
    r"^WITHDRAWAL\s*",
    r"^CASH\s+WITHDRAWAL\s*",
    // misc
    r"^POINT\s+OF\s+SALE\s*",
    r"^PENDING\s*",
    r"^PRE-?AUTHORIZED\s*",
    r"^PREAUTH\s*",
    r"^INSTANT\s+TRANSFER\s*",
    r"^MOBILE\s+PAYMENT\s*",
    r"^CONTACTLESS\s+PAYMENT\s*",
    r"^TAP\s+TO\s+PAY\s*",
    r"^EXTERNAL\s+WITHDRAWAL\s*",
    r"^EXTERNAL\s+DEPOSIT\s*",
];

/// Replaced with a single space wherever they occur.
const INLINE_NOISE: &[&str] = &[
    r"\b\d{3}-\d{3}-\d{4}\b",
    r"\b\d{10,}\b",
    r"(?i)\bCARD\s*\d{4}\b",
    r"(?i)\bXXXX\d{4}\b",
    r"(?i)\bX{2,}\d{4}\b",
    r"\*{2,}\d{4}",
    r"(?i)\bDDA\s*PUR\b",
    r"(?i)\bDDA\b",
    r"(?i)\bCKCD\b",
    r"(?i)\bVISA\b",
    // uppercase only: "Mc" starts real names
    r"\bMC\b",
    r"(?i)\bPUR\b",
    r"(?i)\bP\.O\.S\.\s*",
    r"(?i)\bDES:\s*",
    r"(?i)\bINDN:\s*",
    r"(?i)\bCO ID:\s*\S+",
    r"(?i)\bSEC:\s*\S+",
    r"(?i)\bPPD\s+ID:\s*\S+",
    r"(?i)\bWEB\s+ID:\s*\S+",
    r"(?i)\bTEL\s+ID:\s*\S+",
    r"(?i)\bID:\s*\d+",
];

const TRAILING_NOISE: &[&str] = &[
    r"\s+\d{10,}$",
    r"(?i)\s+REF\s*#?\s*\d+$",
    r"(?i)\s+TRACE\s*#?\s*\d+$",
    r"(?i)\s+CONF\s*#?\s*\d+$",
    r"(?i)\s+AUTH\s*#?\s*\d+$",
    r"(?i)\s+SEQ\s*#?\s*\d+$",
    r"(?i)\s+TXN\s*#?\s*\d+$",
    r"(?i)\s+CARD\s+\d{4}$",
    r"(?i)\s+XXXX\d{4}$",
    r"(?i)\s+X{1,4}\d{4}$",
    r"\s+\*{1,4}\d{4}$",
    r"\s+\d{2}/\d{2}\s*$",
    r"\s+\d{6,8}\s*$",
    r"(?i)\s+DDA\s+\d+$",
    r"(?i)\s+CKCD\s+\d+$",
];

pub const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC", "PR",
];

re!(re_separators, r"[*#]+\s*");
re!(re_trailing_dash, r"\s*-\s*$");
re!(re_leading_dash, r"^\s*[-\u{2013}\u{2014}]\s*");
re!(re_spaces, r"\s{2,}");
re!(re_state_zip, r"(?i)\s+[A-Z]{2}\s+\d{5}(?:-\d{4})?$");
re!(
    re_city_state,
    r",\s*(?:[A-Z][A-Za-z]+\s+)?[A-Z][A-Za-z]+,?\s+([A-Z]{2})$|\s+[A-Z][A-Za-z]+,?\s+([A-Z]{2})$"
);

// ── Normalizer ────────────────────────────────────────────────────────────────

pub struct TextNormalizer {
    mechanisms: RuleTable<TransactionType>,
    prefixes: Vec<Regex>,
    inline_noise: Vec<Regex>,
    trailing_noise: Vec<Regex>,
    merchants: &'static MerchantTable,
}

impl TextNormalizer {
    /// The built-in tables, compiled once.
    pub fn shared() -> &'static TextNormalizer {
        static NORMALIZER: OnceLock<TextNormalizer> = OnceLock::new();
        NORMALIZER.get_or_init(|| TextNormalizer::new().expect("invalid built-in normalizer pattern"))
    }

    pub fn new() -> Result<Self, regex::Error> {
        let prefixes = PREFIXES
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        let inline_noise = INLINE_NOISE
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let trailing_noise = TRAILING_NOISE
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            mechanisms: RuleTable::new(MECHANISMS.iter().copied())?,
            prefixes,
            inline_noise,
            trailing_noise,
            merchants: MerchantTable::shared(),
        })
    }

    pub fn transaction_type(&self, raw: &str) -> Option<TransactionType> {
        self.mechanisms.first_match(raw.trim()).copied()
    }

    pub fn resolve_merchant(&self, text: &str) -> Option<&'static str> {
        self.merchants.resolve(text)
    }

    pub fn clean(&self, raw: &str) -> CleanedDescription {
        let original = raw.trim().to_string();
        if original.is_empty() {
            return CleanedDescription {
                cleaned: UNKNOWN_TRANSACTION.to_string(),
                merchant: None,
                transaction_type: None,
                original,
            };
        }

        let transaction_type = self.transaction_type(&original);
        let desc = self.strip_noise(&original);
        let merchant = self.merchants.resolve(&desc).map(str::to_string);
        let cleaned = match &merchant {
            Some(name) => name.clone(),
            None => title_case(&desc),
        };
        let cleaned = if cleaned.trim().is_empty() {
            UNKNOWN_TRANSACTION.to_string()
        } else {
            cleaned
        };

        CleanedDescription {
            cleaned,
            merchant,
            transaction_type,
            original,
        }
    }

    /// Everything up to merchant resolution: prefixes, inline and trailing
    /// noise, separators, location tails.
    pub fn strip_noise(&self, text: &str) -> String {
        let mut desc = text.trim().to_string();
        for prefix in &self.prefixes {
            desc = prefix.replace(&desc, "").into_owned();
        }
        for noise in &self.inline_noise {
            desc = noise.replace_all(&desc, " ").into_owned();
        }
        for noise in &self.trailing_noise {
            desc = noise.replace(&desc, "").into_owned();
        }

        let desc = re_separators().replace_all(&desc, " ");
        let desc = re_trailing_dash().replace_all(&desc, "");
        let desc = re_leading_dash().replace(&desc, "");
        let desc = re_spaces().replace_all(&desc, " ");
        let desc = desc.trim();

        let desc = re_state_zip().replace(desc, "");
        strip_city_state(&desc).to_string()
    }
}

/// Removes a trailing `, City[ City][,] ST` or ` City ST` when ST is a real
/// state code and something is left over.
fn strip_city_state(desc: &str) -> &str {
    let Some(caps) = re_city_state().captures(desc) else {
        return desc;
    };
    let (Some(whole), Some(state)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
        return desc;
    };
    if !US_STATES.contains(&state.as_str()) {
        return desc;
    }
    let rest = desc[..whole.start()].trim_end();
    if rest.is_empty() {
        desc
    } else {
        rest
    }
}

/// Uppercases the first letter of every word in all-caps or all-lowercase
/// text; mixed-case text passes through.
pub fn title_case(s: &str) -> String {
    let s = s.trim();
    let has_lower = s.chars().any(|c| c.is_lowercase());
    let has_upper = s.chars().any(|c| c.is_uppercase());
    if has_lower && has_upper {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for c in s.to_lowercase().chars() {
        if boundary && !c.is_whitespace() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        boundary = c.is_whitespace() || c == '-' || c == '/';
    }
    out
}

pub fn clean(raw: &str) -> CleanedDescription {
    TextNormalizer::shared().clean(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── clean ─────────────────────────────────────────────────────────────────

    #[test]
    fn pos_debit_starbucks_resolves_merchant() {
        let c = clean("POS DEBIT VISA DDA STARBUCKS STORE #04521 SEATTLE WA 98101");
        assert_eq!(c.cleaned, "Starbucks");
        assert_eq!(c.merchant.as_deref(), Some("Starbucks"));
        assert_eq!(c.transaction_type, Some(TransactionType::Pos));
        assert_eq!(c.original, "POS DEBIT VISA DDA STARBUCKS STORE #04521 SEATTLE WA 98101");
    }

    #[test]
    fn blank_input_is_unknown() {
        let c = clean("   ");
        assert_eq!(c.cleaned, UNKNOWN_TRANSACTION);
        assert!(c.merchant.is_none());
        assert!(c.transaction_type.is_none());
    }

    #[test]
    fn unresolved_text_is_title_cased() {
        let c = clean("ACH DEBIT JOES HARDWARE REF #88123");
        assert_eq!(c.cleaned, "Joes Hardware");
        assert_eq!(c.transaction_type, Some(TransactionType::Ach));
        assert!(c.merchant.is_none());
    }

    #[test]
    fn inline_reference_numbers_removed() {
        let c = clean("CHECKCARD LOCAL BAKERY 800-555-1234 XXXX1234");
        assert_eq!(c.cleaned, "Local Bakery");
        assert_eq!(c.transaction_type, Some(TransactionType::Debit));
    }

    #[test]
    fn city_state_tail_stripped_only_for_real_states() {
        let n = TextNormalizer::shared();
        assert_eq!(n.strip_noise("BLUE DOOR CAFE AUSTIN TX"), "BLUE DOOR CAFE");
        assert_eq!(n.strip_noise("BLUE DOOR CAFE, San Marcos, TX"), "BLUE DOOR CAFE");
        assert_eq!(n.strip_noise("ACME WIDGETS QQ"), "ACME WIDGETS QQ");
        assert_eq!(n.strip_noise("AUSTIN TX"), "AUSTIN TX");
    }

    #[test]
    fn state_zip_tail_stripped() {
        let n = TextNormalizer::shared();
        assert_eq!(n.strip_noise("CORNER DELI NY 10001-1234"), "CORNER DELI");
    }

    #[test]
    fn mixed_case_passes_through() {
        assert_eq!(clean("Joe's Pub").cleaned, "Joe's Pub");
    }

    #[test]
    fn clean_is_idempotent_on_clean_output() {
        for raw in [
            "POS DEBIT VISA DDA STARBUCKS STORE #04521 SEATTLE WA 98101",
            "ACH DEBIT JOES HARDWARE REF #88123",
            "Joe's Pub",
            "CHECKCARD LOCAL BAKERY 800-555-1234",
        ] {
            let once = clean(raw).cleaned;
            assert_eq!(clean(&once).cleaned, once, "not idempotent for {raw}");
        }
    }

    // ── mechanisms ────────────────────────────────────────────────────────────

    #[test]
    fn mechanism_detection_order() {
        let n = TextNormalizer::shared();
        assert_eq!(n.transaction_type("POINT OF SALE 123"), Some(TransactionType::Pos));
        assert_eq!(n.transaction_type("chk crd 1"), Some(TransactionType::Debit));
        assert_eq!(n.transaction_type("AUTOPAY NETFLIX"), Some(TransactionType::Recurring));
        assert_eq!(n.transaction_type("BILL PAY ELECTRIC"), Some(TransactionType::BillPay));
        assert_eq!(n.transaction_type("TAP TO PAY"), Some(TransactionType::MobilePay));
        assert_eq!(n.transaction_type("DIRECT DEPOSIT ACME"), Some(TransactionType::Deposit));
        assert_eq!(n.transaction_type("Starbucks"), None);
    }

    // ── title_case ────────────────────────────────────────────────────────────

    #[test]
    fn title_case_handles_separators() {
        assert_eq!(title_case("HY-VEE/FUEL"), "Hy-Vee/Fuel");
        assert_eq!(title_case("corner store"), "Corner Store");
        assert_eq!(title_case("McDonald"), "McDonald");
    }
}
