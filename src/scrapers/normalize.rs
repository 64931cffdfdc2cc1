//! Coercion of scraped text into numeric listing fields.
//!
//! Both functions are total: malformed input degrades to `0` so callers never
//! need a separate error path for numeric text.

/// Area unit marker used in criteria text ("45 m²")
pub const AREA_MARKER: &str = "m²";

/// Parse a price such as "1 234 €" or "950 € / mois" into whole euros.
pub fn normalize_price(text: &str) -> u64 {
    digits_only(text)
}

/// Parse the numeric part preceding an area marker ("45 ") into square meters.
pub fn normalize_size(text: &str) -> u64 {
    digits_only(text)
}

fn digits_only(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
