//! Suggestions and batch corrections over the full transaction set.

pub mod address;
pub mod classifier;
pub mod context;
pub mod lookup;
pub mod transfer;
pub mod vendor;

pub use address::{detect_address, AddressMatch};
pub use classifier::{analyze_unclassified, reclassify_all, Classification, Classifier, SignalWeights};
pub use context::{transaction_context, TransactionContext};
pub use lookup::{
    auto_search_and_classify, infer_category_from_text, search_for_context, BusinessLookup, LookupCache,
    LookupError, LookupOutcome, LookupText, MockLookup, SearchResult, SearchSummary, WebLookup,
};
pub use transfer::{
    confirmed_transfers, mark_transfer_pair, unmark_transfer_pair, ConfirmedTransfer, TransferDetector,
    TransferPair,
};
pub use vendor::{
    actionable_vendor_groups, apply_all_vendor_categories, apply_vendor_category, find_vendor_siblings,
    normalize_vendor_key, vendor_groups, vendor_key, VendorApplySummary, VendorGroup, VendorSiblings,
};

/// Case-folded alphanumerics only. Used to compare descriptions and key caches.
pub fn comparison_key(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
