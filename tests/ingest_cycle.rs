// tests/ingest_cycle.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use market_news_feed::error::{CycleError, ScrapeError, StoreError};
use market_news_feed::ingest::{self, types::NewsScraper};
use market_news_feed::model::{Article, HeadlineRecord, SentimentRecord};
use market_news_feed::store::{ArticleStore, MemoryArticleStore, PendingQuery};

struct StaticScraper {
    name: &'static str,
    items: Vec<(&'static str, &'static str)>,
}

#[async_trait]
impl NewsScraper for StaticScraper {
    async fn fetch_latest(&self) -> Result<Vec<HeadlineRecord>, ScrapeError> {
        Ok(self
            .items
            .iter()
            .map(|(h, u)| HeadlineRecord {
                headline: h.to_string(),
                url: u.to_string(),
                source: self.name.to_string(),
            })
            .collect())
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

struct BrokenScraper;

#[async_trait]
impl NewsScraper for BrokenScraper {
    async fn fetch_latest(&self) -> Result<Vec<HeadlineRecord>, ScrapeError> {
        Err(ScrapeError::Status {
            status: 503,
            url: "https://down.test/".into(),
        })
    }
    fn name(&self) -> &'static str {
        "Broken"
    }
}

/// Memory store that rejects inserts for one poisoned url.
struct FlakyStore {
    inner: MemoryArticleStore,
    poisoned_url: &'static str,
}

#[async_trait]
impl ArticleStore for FlakyStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<Article>, StoreError> {
        self.inner.find_by_url(url).await
    }
    async fn find_unanalyzed(&self, query: PendingQuery) -> Result<Vec<Article>, StoreError> {
        self.inner.find_unanalyzed(query).await
    }
    async fn insert(
        &self,
        record: HeadlineRecord,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Article, StoreError> {
        if record.url == self.poisoned_url {
            return Err(StoreError::Constraint("write rejected".into()));
        }
        self.inner.insert(record, published_at).await
    }
    async fn attach_sentiment(&self, id: u64, record: SentimentRecord) -> Result<(), StoreError> {
        self.inner.attach_sentiment(id, record).await
    }
    async fn record_failed_attempt(&self, id: u64, at: DateTime<Utc>) -> Result<u32, StoreError> {
        self.inner.record_failed_attempt(id, at).await
    }
    async fn list_recent(&self, limit: usize) -> Result<Vec<Article>, StoreError> {
        self.inner.list_recent(limit).await
    }
    async fn list_all(&self) -> Result<Vec<Article>, StoreError> {
        self.inner.list_all().await
    }
    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}

fn two_sources() -> Vec<Box<dyn NewsScraper>> {
    vec![
        Box::new(StaticScraper {
            name: "A",
            items: vec![("Sensex rises", "https://a.test/1"), ("Nifty dips", "https://a.test/2")],
        }),
        Box::new(StaticScraper {
            name: "B",
            items: vec![("Rupee steady", "https://b.test/1")],
        }),
    ]
}

#[tokio::test]
async fn reingesting_same_urls_stores_each_once() {
    let store = MemoryArticleStore::new();
    let scrapers = two_sources();

    let first = ingest::run_once(&scrapers, &store).await.unwrap();
    assert_eq!(first.inserted, 3);
    assert_eq!(first.candidates, 3);

    let second = ingest::run_once(&scrapers, &store).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 3);

    assert_eq!(store.count().await.unwrap(), 3);
    assert!(store.find_by_url("https://a.test/1").await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_within_one_batch_is_inserted_once() {
    let store = MemoryArticleStore::new();
    let scrapers: Vec<Box<dyn NewsScraper>> = vec![
        Box::new(StaticScraper {
            name: "A",
            items: vec![("Same story", "https://same.test/x")],
        }),
        Box::new(StaticScraper {
            name: "B",
            items: vec![("Same story, other wording", "https://same.test/x")],
        }),
    ];
    let report = ingest::run_once(&scrapers, &store).await.unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    let stored = store.find_by_url("https://same.test/x").await.unwrap().unwrap();
    assert_eq!(stored.source, "A", "registration order decides which copy wins");
}

#[tokio::test]
async fn failing_scraper_does_not_block_the_other() {
    let store = MemoryArticleStore::new();
    let scrapers: Vec<Box<dyn NewsScraper>> = vec![
        Box::new(BrokenScraper),
        Box::new(StaticScraper {
            name: "B",
            items: vec![("Rupee steady", "https://b.test/1"), ("Gold up", "https://b.test/2")],
        }),
    ];
    let report = ingest::run_once(&scrapers, &store).await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn merge_follows_registration_order() {
    let merged = ingest::collect(&two_sources()).await;
    let urls: Vec<&str> = merged.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a.test/1", "https://a.test/2", "https://b.test/1"]);
}

#[tokio::test]
async fn per_record_persist_failure_is_skipped() {
    let store = FlakyStore {
        inner: MemoryArticleStore::new(),
        poisoned_url: "https://a.test/2",
    };
    let report = ingest::run_once(&two_sources(), &store).await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 1);
    assert!(store.find_by_url("https://b.test/1").await.unwrap().is_some());
}

#[tokio::test]
async fn unavailable_store_aborts_cycle() {
    let store = Arc::new(MemoryArticleStore::new());
    store.set_available(false);
    let err = ingest::run_once(&two_sources(), store.as_ref()).await.unwrap_err();
    assert!(matches!(err, CycleError::StorageUnavailable(_)));
}

#[tokio::test]
async fn published_at_defaults_to_ingestion_time() {
    let store = MemoryArticleStore::new();
    let before = Utc::now();
    ingest::run_once(&two_sources(), &store).await.unwrap();
    let a = store.find_by_url("https://a.test/1").await.unwrap().unwrap();
    assert!(a.published_at >= before);
    assert!(a.sentiment.is_none());
}
