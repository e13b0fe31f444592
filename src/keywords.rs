// src/keywords.rs
//! Keyword extraction from instrument display names.

use std::collections::BTreeSet;

/// Tokens too generic to identify a company.
const STOP_WORDS: &[&str] = &[
    "THE",
    "AND",
    "PRIVATE",
    "LIMITED",
    "LTD",
    "INDIA",
    "CORPORATION",
    "CORP",
    "ETF",
];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '.' | '-')
}

/// Uppercase `instrument_name`, split on whitespace/comma/period/hyphen runs
/// and keep tokens longer than two characters that are not stop words.
///
/// Empty or whitespace-only input yields an empty set.
pub fn extract_keywords(instrument_name: &str) -> BTreeSet<String> {
    instrument_name
        .to_uppercase()
        .split(is_separator)
        .filter(|t| t.chars().count() > 2)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}
