//! Identifier normalization.
//!
//! Upstream feeds mix padding, separators, and field sources (`cn` vs
//! `nregistro`), so raw codes must never be compared directly. Every
//! identity comparison in the system — catalog matching, snapshot diffing,
//! search — goes through [`normalize`].

/// Canonicalizes a raw product code into a comparable key.
///
/// Keeps only the ASCII digits of the input, in their original order.
/// Returns an empty string when the input is empty or contains no digits.
///
/// Pure and total; idempotent (`normalize(normalize(x)) == normalize(x)`).
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// [`normalize`] lifted over an absent input.
///
/// Absent input normalizes to the empty string, which no catalog contains.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}
