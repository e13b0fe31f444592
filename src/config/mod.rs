// src/config/mod.rs
pub mod ai;
pub mod feed;

pub use ai::ReasoningConfig;
pub use feed::{AnalysisConfig, FeedConfig, ListConfig, SchedulerConfig, ScrapeConfig};
