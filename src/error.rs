// src/error.rs
//! Error taxonomy for the ingestion and analysis pipeline.
//!
//! Everything here except `StoreError::Unavailable` is recoverable at the
//! record level: a failing source yields nothing, a failing record is
//! skipped, a failing headline stays unanalyzed for a later cycle.

use thiserror::Error;

/// Per-source scrape failure. Never fatal to an ingestion cycle.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Errors surfaced by an [`crate::store::ArticleStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store cannot be reached. Aborts the running cycle.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// `url` already stored. Expected outcome of deduplication, not a failure.
    #[error("article with url {0} already exists")]
    Duplicate(String),
    #[error("article {0} not found")]
    NotFound(u64),
    /// A field-level constraint was violated (range, immutability, empty text).
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Why a headline could not be turned into a [`crate::model::SentimentRecord`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassificationError {
    /// The reasoning service could not be reached or answered with an error.
    #[error("reasoning service call failed: {0}")]
    Transport(String),
    /// The reply text is not JSON at all.
    #[error("reply is not valid JSON: {0}")]
    MalformedResponse(String),
    /// Valid JSON, but neither the flat nor the entities shape.
    #[error("reply does not match the judgment schema: {0}")]
    InvalidSchema(String),
    #[error("reply carries an empty entities mapping")]
    EmptyEntities,
}

impl ClassificationError {
    /// Stable label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassificationError::Transport(_) => "transport",
            ClassificationError::MalformedResponse(_) => "malformed_response",
            ClassificationError::InvalidSchema(_) => "invalid_schema",
            ClassificationError::EmptyEntities => "empty_entities",
        }
    }

    /// True when the reply for this particular headline was unusable.
    /// Transport failures say nothing about the headline and are not
    /// counted against its retry budget.
    pub fn is_headline_specific(&self) -> bool {
        !matches!(self, ClassificationError::Transport(_))
    }
}

/// Failure of a whole ingestion or analysis cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("storage unavailable, cycle aborted: {0}")]
    StorageUnavailable(String),
    #[error("{0} cycle already running, trigger skipped")]
    AlreadyRunning(&'static str),
}

// Record-level store errors are handled where they occur; anything reaching
// this conversion ends the cycle.
impl From<StoreError> for CycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => CycleError::StorageUnavailable(msg),
            other => CycleError::StorageUnavailable(other.to_string()),
        }
    }
}
