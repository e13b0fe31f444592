// src/portfolio.rs
//! Portfolio holdings as seen by the relevance matcher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::keywords::extract_keywords;

/// One holding: ticker plus the uppercase tokens used to find it in headlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub symbol: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
}

fn clean_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl PortfolioEntry {
    /// Manually entered holding: the symbol is its only keyword.
    pub fn from_symbol(symbol: &str) -> Self {
        let symbol = clean_symbol(symbol);
        let mut keywords = BTreeSet::new();
        if !symbol.is_empty() {
            keywords.insert(symbol.clone());
        }
        Self { symbol, keywords }
    }

    /// Broker-synced holding: symbol plus tokens of the instrument's name.
    pub fn from_instrument(symbol: &str, instrument_name: &str) -> Self {
        let mut entry = Self::from_symbol(symbol);
        entry.keywords.extend(extract_keywords(instrument_name));
        entry
    }
}

/// Union of every holding's keywords, trimmed, uppercased, blanks dropped.
pub fn portfolio_keywords(entries: &[PortfolioEntry]) -> BTreeSet<String> {
    entries
        .iter()
        .flat_map(|e| e.keywords.iter())
        .map(|k| k.trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect()
}
