// src/analyze/mod.rs
//! Sentiment enrichment: reasoning-service adapter, reply normalization and
//! the batch worker.

pub mod ai_adapter;
pub mod classifier;
pub mod worker;

pub use classifier::{normalize_reply, SentimentClassifier};
pub use worker::{AnalysisReport, AnalysisWorker};
