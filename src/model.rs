// src/model.rs
//! Core records: stored articles and the canonical sentiment judgment.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// Market impact of a headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

impl Impact {
    /// Parse the exact labels the reasoning service is instructed to use.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Positive" => Some(Impact::Positive),
            "Negative" => Some(Impact::Negative),
            "Neutral" => Some(Impact::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Positive => write!(f, "Positive"),
            Impact::Negative => write!(f, "Negative"),
            Impact::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Canonical judgment attached to an article. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub impact: Impact,
    pub reasoning: String,
    /// Always within `0.0..=1.0`.
    pub confidence: f64,
}

impl SentimentRecord {
    /// Validate the field constraints the store enforces.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.reasoning.trim().is_empty() {
            return Err(StoreError::Constraint("reasoning must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(StoreError::Constraint(format!(
                "confidence {} outside 0.0..=1.0",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// A scraped headline about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineRecord {
    pub headline: String,
    pub url: String,
    pub source: String,
}

/// A stored article. `url` is its canonical identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u64,
    pub headline: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentRecord>,
    /// Failed classification attempts so far.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// When a not-yet-analyzed article may be handed to the classifier again.
///
/// Backoff doubles per failed attempt; at `max_attempts` the article is
/// dead-lettered and never selected again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::seconds(60),
        }
    }
}

impl RetryPolicy {
    pub fn is_dead_lettered(&self, article: &Article) -> bool {
        article.attempts >= self.max_attempts
    }

    /// Delay required after the `attempts`-th failure (0 for a fresh article).
    pub fn backoff_for(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::zero();
        }
        let factor = 1i32.checked_shl(attempts.saturating_sub(1).min(20)).unwrap_or(i32::MAX);
        self.backoff_base * factor
    }

    pub fn is_eligible(&self, article: &Article, now: DateTime<Utc>) -> bool {
        if article.sentiment.is_some() || self.is_dead_lettered(article) {
            return false;
        }
        match article.last_attempt_at {
            None => true,
            Some(at) => now - at >= self.backoff_for(article.attempts),
        }
    }
}
