// src/feed.rs
//! Caller-facing operations over one explicitly constructed store, scraper
//! set and analysis worker.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::analyze::AnalysisWorker;
use crate::error::CycleError;
use crate::ingest::{self, types::NewsScraper, IngestReport};
use crate::model::Article;
use crate::relevance::RelevanceMatcher;
use crate::scheduler::{record_skip, CycleGuard, CycleKind};
use crate::store::{newest_first, DynArticleStore};

pub struct NewsFeed {
    store: DynArticleStore,
    scrapers: Vec<Box<dyn NewsScraper>>,
    worker: AnalysisWorker,
    guard: CycleGuard,
}

impl NewsFeed {
    pub fn new(
        store: DynArticleStore,
        scrapers: Vec<Box<dyn NewsScraper>>,
        worker: AnalysisWorker,
    ) -> Self {
        Self {
            store,
            scrapers,
            worker,
            guard: CycleGuard::new(),
        }
    }

    pub fn store(&self) -> &DynArticleStore {
        &self.store
    }

    pub fn guard(&self) -> &CycleGuard {
        &self.guard
    }

    /// Scrape, deduplicate by url and persist. Returns the full report.
    pub async fn run_ingestion_report(&self) -> Result<IngestReport, CycleError> {
        let Some(_token) = self.guard.try_acquire(CycleKind::Ingestion) else {
            record_skip(CycleKind::Ingestion);
            return Err(CycleError::AlreadyRunning(CycleKind::Ingestion.as_str()));
        };
        ingest::run_once(&self.scrapers, self.store.as_ref()).await
    }

    /// Number of newly stored articles.
    pub async fn run_ingestion_cycle(&self) -> Result<usize, CycleError> {
        self.run_ingestion_report().await.map(|r| r.inserted)
    }

    /// Number of articles that received a sentiment.
    pub async fn run_analysis_cycle(&self, batch_size: usize) -> Result<usize, CycleError> {
        let Some(_token) = self.guard.try_acquire(CycleKind::Analysis) else {
            record_skip(CycleKind::Analysis);
            return Err(CycleError::AlreadyRunning(CycleKind::Analysis.as_str()));
        };
        self.worker.run_once(batch_size).await.map(|r| r.analyzed)
    }

    /// Newest articles first. A store failure yields an empty list.
    pub async fn list_recent(&self, limit: usize) -> Vec<Article> {
        match self.store.list_recent(limit).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "list_recent failed, returning empty");
                Vec::new()
            }
        }
    }

    /// Newest articles whose headline mentions any of `keywords`.
    pub async fn list_matching(&self, keywords: &BTreeSet<String>, limit: usize) -> Vec<Article> {
        let Some(matcher) = RelevanceMatcher::new(keywords) else {
            return Vec::new();
        };
        match self.store.list_all().await {
            Ok(all) => {
                let mut out: Vec<Article> = all
                    .into_iter()
                    .filter(|a| matcher.is_match(&a.headline))
                    .collect();
                out.sort_by(newest_first);
                out.truncate(limit);
                out
            }
            Err(e) => {
                tracing::warn!(error = %e, "list_matching failed, returning empty");
                Vec::new()
            }
        }
    }
}

pub type SharedFeed = Arc<NewsFeed>;
