// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ai::ReasoningConfig;
use crate::model::RetryPolicy;

pub const ENV_FEED_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const DEFAULT_FEED_CONFIG_PATH: &str = "config/feed.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30 * 60,
            run_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub batch_size: usize,
    /// Pause between reasoning-service calls.
    pub inter_call_delay_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_call_delay_ms: 2_000,
            max_attempts: 5,
            backoff_base_secs: 60,
        }
    }
}

impl AnalysisConfig {
    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: chrono::Duration::seconds(self.backoff_base_secs.min(i32::MAX as u64) as i64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "market-news-feed/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Default page size of the read APIs.
    pub list_limit: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self { list_limit: 50 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub scheduler: SchedulerConfig,
    pub analysis: AnalysisConfig,
    pub reasoning: ReasoningConfig,
    pub scrape: ScrapeConfig,
    pub feed: ListConfig,
}

impl FeedConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: FeedConfig = toml::from_str(s).context("parsing feed config toml")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $FEED_CONFIG_PATH
    /// 2) config/feed.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_FEED_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_FEED_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_FEED_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from_file(&default_p)?
            } else {
                FeedConfig::default()
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    /// `ANALYSIS_BATCH_SIZE`, `ANALYSIS_DELAY_MS`, `SCHEDULER_INTERVAL_SECS`,
    /// `AI_ENABLED`. Unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
        }
        if let Some(v) = parsed("ANALYSIS_BATCH_SIZE") {
            self.analysis.batch_size = v;
        }
        if let Some(v) = parsed("ANALYSIS_DELAY_MS") {
            self.analysis.inter_call_delay_ms = v;
        }
        if let Some(v) = parsed("SCHEDULER_INTERVAL_SECS") {
            self.scheduler.interval_secs = v;
        }
        if let Some(v) = parsed("AI_ENABLED") {
            self.reasoning.enabled = v;
        }
    }

    /// Clamp values that would stall or disable a cycle.
    pub fn sanitize(&mut self) {
        self.analysis.batch_size = self.analysis.batch_size.max(1);
        self.analysis.max_attempts = self.analysis.max_attempts.max(1);
        self.scheduler.interval_secs = self.scheduler.interval_secs.max(1);
        self.scrape.timeout_secs = self.scrape.timeout_secs.clamp(1, 120);
        self.feed.list_limit = self.feed.list_limit.max(1);
        self.reasoning.sanitize();
    }
}
