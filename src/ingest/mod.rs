// src/ingest/mod.rs
pub mod providers;
pub mod types;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::error::{CycleError, StoreError};
use crate::ingest::types::{HeadlineRecord, NewsScraper};
use crate::store::ArticleStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Headline records extracted from sources."
        );
        describe_counter!("ingest_inserted_total", "New articles persisted.");
        describe_counter!(
            "ingest_duplicates_total",
            "Candidates whose url was already stored."
        );
        describe_counter!(
            "ingest_persist_errors_total",
            "Per-record persistence failures."
        );
        describe_counter!("ingest_scrape_errors_total", "Source fetch/parse errors.");
        describe_histogram!("ingest_scrape_ms", "Listing parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingestion last ran.");
    });
}

/// Normalize scraped headline text: decode entities, strip tags, straighten
/// quotes, collapse whitespace.
pub fn normalize_headline(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Outcome of one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records extracted across all sources.
    pub candidates: usize,
    /// Records actually inserted.
    pub inserted: usize,
    pub duplicates: usize,
    /// Records whose persistence failed and were skipped.
    pub failed: usize,
}

/// Run every scraper concurrently and merge results in registration order.
pub async fn collect(scrapers: &[Box<dyn NewsScraper>]) -> Vec<HeadlineRecord> {
    join_all(scrapers.iter().map(|s| s.fetch()))
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// Persist candidates whose url is not stored yet.
///
/// Per-record failures are logged and skipped; only an unavailable store
/// aborts the batch.
pub async fn persist_new(
    store: &dyn ArticleStore,
    candidates: Vec<HeadlineRecord>,
) -> Result<IngestReport, CycleError> {
    let mut report = IngestReport {
        candidates: candidates.len(),
        ..IngestReport::default()
    };

    for rec in candidates {
        match store.find_by_url(&rec.url).await {
            Ok(Some(_)) => {
                report.duplicates += 1;
                continue;
            }
            Ok(None) => {}
            Err(StoreError::Unavailable(msg)) => return Err(CycleError::StorageUnavailable(msg)),
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, url = %rec.url, "lookup failed, record skipped");
                report.failed += 1;
                continue;
            }
        }

        let headline = rec.headline.clone();
        match store.insert(rec, None).await {
            Ok(article) => {
                tracing::debug!(target: "ingest", id = article.id, url = %article.url, "stored");
                report.inserted += 1;
            }
            // Lost a race with a concurrent insert of the same url.
            Err(StoreError::Duplicate(_)) => report.duplicates += 1,
            Err(StoreError::Unavailable(msg)) => return Err(CycleError::StorageUnavailable(msg)),
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, %headline, "error saving article");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Scrape all sources once and store the new articles.
pub async fn run_once(
    scrapers: &[Box<dyn NewsScraper>],
    store: &dyn ArticleStore,
) -> Result<IngestReport, CycleError> {
    ensure_metrics_described();

    let candidates = collect(scrapers).await;
    tracing::info!(target: "ingest", total = candidates.len(), "scraped all sources");

    let report = persist_new(store, candidates).await?;

    counter!("ingest_inserted_total").increment(report.inserted as u64);
    counter!("ingest_duplicates_total").increment(report.duplicates as u64);
    counter!("ingest_persist_errors_total").increment(report.failed as u64);
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    tracing::info!(
        target: "ingest",
        candidates = report.candidates,
        inserted = report.inserted,
        duplicates = report.duplicates,
        failed = report.failed,
        "ingestion cycle complete"
    );
    Ok(report)
}
