// src/ingest/types.rs
use async_trait::async_trait;
use metrics::counter;

use crate::error::ScrapeError;
pub use crate::model::HeadlineRecord;

#[async_trait]
pub trait NewsScraper: Send + Sync {
    /// Fetch and extract the current headlines of this source.
    async fn fetch_latest(&self) -> Result<Vec<HeadlineRecord>, ScrapeError>;

    fn name(&self) -> &'static str;

    /// Like `fetch_latest`, but a failure is logged and degrades to no records.
    async fn fetch(&self) -> Vec<HeadlineRecord> {
        match self.fetch_latest().await {
            Ok(v) => {
                tracing::info!(target: "ingest", source = self.name(), count = v.len(), "scraped");
                v
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, source = self.name(), "scrape failed");
                counter!("ingest_scrape_errors_total", "source" => self.name()).increment(1);
                Vec::new()
            }
        }
    }
}
