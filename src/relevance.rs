// src/relevance.rs
//! Portfolio relevance: keep articles whose headline mentions a holding.
//!
//! Matching is a case-insensitive substring test against one alternation of
//! all portfolio keywords. There is no word-boundary check, so "TATA" also
//! matches inside "TATAMOTORS"; this permissive policy is intended.

use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use crate::model::Article;

/// Compiled alternation over a non-empty keyword set.
#[derive(Debug, Clone)]
pub struct RelevanceMatcher {
    pattern: Regex,
    keywords: usize,
}

impl RelevanceMatcher {
    /// Build a matcher; `None` when there is no non-blank keyword, so callers
    /// never run an empty pattern (which would match everything).
    pub fn new<'a, I>(keywords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let alternatives: BTreeSet<String> = keywords
            .into_iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return None;
        }
        let joined = alternatives.iter().cloned().collect::<Vec<_>>().join("|");
        let pattern = match RegexBuilder::new(&joined).case_insensitive(true).build() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "relevance pattern failed to compile");
                return None;
            }
        };
        Some(Self {
            pattern,
            keywords: alternatives.len(),
        })
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords
    }

    pub fn is_match(&self, headline: &str) -> bool {
        self.pattern.is_match(headline)
    }

    /// Matching articles in input order.
    pub fn filter<'a, I>(&self, articles: I) -> Vec<Article>
    where
        I: IntoIterator<Item = &'a Article>,
    {
        articles
            .into_iter()
            .filter(|a| self.is_match(&a.headline))
            .cloned()
            .collect()
    }
}

/// Filter `articles` by `keywords`, preserving order. An empty keyword set
/// returns an empty result without inspecting any article.
pub fn match_articles(articles: &[Article], keywords: &BTreeSet<String>) -> Vec<Article> {
    match RelevanceMatcher::new(keywords) {
        Some(m) => m.filter(articles),
        None => Vec::new(),
    }
}
