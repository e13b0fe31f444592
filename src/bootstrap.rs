// src/bootstrap.rs
//! Explicit construction of the pipeline from config: one store handle, one
//! HTTP client for sources, one reasoning client, passed down by value.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::analyze::ai_adapter::build_client_from_config;
use crate::analyze::{AnalysisWorker, SentimentClassifier};
use crate::api::{self, AppState};
use crate::config::FeedConfig;
use crate::feed::NewsFeed;
use crate::ingest::providers::{build_http_client, default_scrapers};
use crate::metrics::Metrics;
use crate::scheduler::{spawn_scheduler, SchedulerCfg, SchedulerHandle};
use crate::store::DynArticleStore;

pub struct FeedRuntime {
    pub cfg: FeedConfig,
    pub feed: Arc<NewsFeed>,
    pub classifier: SentimentClassifier,
}

impl FeedRuntime {
    pub fn from_config(cfg: FeedConfig, store: DynArticleStore) -> anyhow::Result<Self> {
        let http = build_http_client(cfg.scrape.timeout_secs, &cfg.scrape.user_agent)?;
        let scrapers = default_scrapers(http);

        let client = build_client_from_config(&cfg.reasoning)?;
        // Safe diagnostics: provider + enabled only
        info!(
            provider = client.provider_name(),
            enabled = cfg.reasoning.enabled,
            model = %cfg.reasoning.model,
            "reasoning client ready"
        );
        let classifier = SentimentClassifier::new(client);

        let worker = AnalysisWorker::new(
            classifier.clone(),
            Arc::clone(&store),
            cfg.analysis.inter_call_delay(),
            cfg.analysis.retry_policy(),
        );
        let feed = Arc::new(NewsFeed::new(store, scrapers, worker));
        Ok(Self {
            cfg,
            feed,
            classifier,
        })
    }

    /// Spawn the periodic scheduler and build the HTTP router, with
    /// `/metrics` merged in when a recorder is given.
    ///
    /// Install the recorder before calling this: metric descriptions are
    /// emitted once per process, on the first cycle.
    pub fn start(&self, metrics: Option<&Metrics>) -> (Router, SchedulerHandle) {
        let scheduler = spawn_scheduler(
            Arc::clone(&self.feed),
            SchedulerCfg {
                interval: Duration::from_secs(self.cfg.scheduler.interval_secs),
                batch_size: self.cfg.analysis.batch_size,
                run_on_startup: self.cfg.scheduler.run_on_startup,
            },
        );

        let state = AppState::new(
            Arc::clone(&self.feed),
            self.cfg.feed.list_limit,
            self.cfg.analysis.batch_size,
        );
        let mut router = api::router(state);
        if let Some(m) = metrics {
            router = router.merge(m.router());
        }
        (router, scheduler)
    }

    /// One-off smoke test of the reasoning service. Logs the outcome, never fails.
    pub async fn quick_probe(&self) {
        if !self.cfg.reasoning.enabled {
            warn!("reasoning quick_probe skipped: disabled in config");
            return;
        }
        let sample = "Reliance Industries shares surge after strong quarterly earnings";
        match self.classifier.classify(sample).await {
            Ok(r) => info!(impact = %r.impact, confidence = r.confidence, "reasoning quick_probe ok"),
            Err(e) => warn!(kind = e.kind(), error = %e, "reasoning quick_probe failed"),
        }
    }
}
