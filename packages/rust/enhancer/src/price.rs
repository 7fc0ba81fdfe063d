//! Price text detection.

use std::sync::LazyLock;

use regex::Regex;

/// Matches currency-symbol or ISO-code price text, e.g. `$49.99`, `€1.299,00`,
/// `49.99 USD`.
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[$€£¥]\s?\d[\d.,]*)|(?:\d[\d.,]*\s?(?:USD|EUR|GBP|JPY))")
        .expect("valid price regex")
});

/// Whether the text contains something that reads as a price.
pub(crate) fn looks_like_price(text: &str) -> bool {
    PRICE_RE.is_match(text)
}

/// Extract the first price-looking substring, if any.
pub(crate) fn extract_price(text: &str) -> Option<String> {
    PRICE_RE.find(text).map(|m| m.as_str().to_string())
}
