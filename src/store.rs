// src/store.rs
//! Article storage seam and an in-memory implementation.
//!
//! All writes are single-record operations keyed by `url` or `id`, so the
//! ingestion and analysis cycles can interleave without extra locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{Article, HeadlineRecord, RetryPolicy, SentimentRecord};

/// Selection of articles still waiting for a sentiment judgment.
#[derive(Debug, Clone, Copy)]
pub struct PendingQuery {
    pub limit: usize,
    pub now: DateTime<Utc>,
    pub retry: RetryPolicy,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, StoreError>;

    /// Up to `limit` unanalyzed, retry-eligible articles, oldest insertion first.
    async fn find_unanalyzed(&self, query: PendingQuery) -> Result<Vec<Article>, StoreError>;

    /// Insert a new article. `published_at` defaults to now when absent.
    /// Fails with [`StoreError::Duplicate`] when the url is already stored.
    async fn insert(
        &self,
        record: HeadlineRecord,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Article, StoreError>;

    /// Attach a judgment. Rejected if one is already attached.
    async fn attach_sentiment(&self, id: u64, record: SentimentRecord) -> Result<(), StoreError>;

    /// Bump the attempt counter after a failed classification; returns the new count.
    async fn record_failed_attempt(&self, id: u64, at: DateTime<Utc>) -> Result<u32, StoreError>;

    /// Newest `published_at` first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Article>, StoreError>;

    /// Every stored article, in no particular order.
    async fn list_all(&self) -> Result<Vec<Article>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

pub type DynArticleStore = Arc<dyn ArticleStore>;

/// Ordering used by every listing: `published_at` descending, then id descending.
pub fn newest_first(a: &Article, b: &Article) -> std::cmp::Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[derive(Default)]
struct Inner {
    articles: Vec<Article>,
    by_url: HashMap<String, usize>,
    by_id: HashMap<u64, usize>,
    next_id: u64,
}

/// Insertion-ordered store behind a tokio `RwLock`.
pub struct MemoryArticleStore {
    inner: RwLock<Inner>,
    available: AtomicBool,
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: every operation fails with `Unavailable` while false.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".into()))
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, StoreError> {
        self.ensure_available()?;
        let g = self.inner.read().await;
        Ok(g.by_url.get(url).map(|&i| g.articles[i].clone()))
    }

    async fn find_unanalyzed(&self, query: PendingQuery) -> Result<Vec<Article>, StoreError> {
        self.ensure_available()?;
        let g = self.inner.read().await;
        Ok(g.articles
            .iter()
            .filter(|a| query.retry.is_eligible(a, query.now))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        record: HeadlineRecord,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Article, StoreError> {
        self.ensure_available()?;
        if record.headline.trim().is_empty() || record.url.trim().is_empty() {
            return Err(StoreError::Constraint("headline and url are required".into()));
        }
        let mut g = self.inner.write().await;
        if g.by_url.contains_key(&record.url) {
            return Err(StoreError::Duplicate(record.url));
        }
        let id = g.next_id;
        g.next_id += 1;
        let article = Article {
            id,
            headline: record.headline,
            url: record.url,
            source: record.source,
            published_at: published_at.unwrap_or_else(Utc::now),
            sentiment: None,
            attempts: 0,
            last_attempt_at: None,
        };
        let idx = g.articles.len();
        g.by_url.insert(article.url.clone(), idx);
        g.by_id.insert(id, idx);
        g.articles.push(article.clone());
        Ok(article)
    }

    async fn attach_sentiment(&self, id: u64, record: SentimentRecord) -> Result<(), StoreError> {
        self.ensure_available()?;
        record.check()?;
        let mut g = self.inner.write().await;
        let idx = *g.by_id.get(&id).ok_or(StoreError::NotFound(id))?;
        let article = &mut g.articles[idx];
        if article.sentiment.is_some() {
            return Err(StoreError::Constraint(format!(
                "article {id} already carries a sentiment"
            )));
        }
        article.sentiment = Some(record);
        Ok(())
    }

    async fn record_failed_attempt(&self, id: u64, at: DateTime<Utc>) -> Result<u32, StoreError> {
        self.ensure_available()?;
        let mut g = self.inner.write().await;
        let idx = *g.by_id.get(&id).ok_or(StoreError::NotFound(id))?;
        let article = &mut g.articles[idx];
        article.attempts = article.attempts.saturating_add(1);
        article.last_attempt_at = Some(at);
        Ok(article.attempts)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Article>, StoreError> {
        self.ensure_available()?;
        let g = self.inner.read().await;
        let mut refs: Vec<&Article> = g.articles.iter().collect();
        refs.sort_by(|a, b| newest_first(a, b));
        Ok(refs.into_iter().take(limit).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Article>, StoreError> {
        self.ensure_available()?;
        Ok(self.inner.read().await.articles.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.ensure_available()?;
        Ok(self.inner.read().await.articles.len())
    }
}
