// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod feed;
pub mod keywords;
pub mod metrics;
pub mod model;
pub mod portfolio;
pub mod relevance;
pub mod scheduler;
pub mod store;

// Scrape -> persist
pub mod ingest;

// Reasoning service -> sentiment
pub mod analyze;

// ---- Re-exports for stable public API ----
pub use crate::analyze::ai_adapter;
pub use crate::api::router;
pub use crate::error::{ClassificationError, CycleError, ScrapeError, StoreError};
pub use crate::feed::NewsFeed;
pub use crate::keywords::extract_keywords;
pub use crate::model::{Article, HeadlineRecord, Impact, SentimentRecord};
