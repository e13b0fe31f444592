//! Analysis worker: classify stored articles that still lack a sentiment.
//!
//! Articles are processed one at a time with a fixed pause between
//! reasoning-service calls. A headline whose reply is unusable stays
//! unanalyzed and is retried by a later cycle after its backoff, until it is
//! dead-lettered. A transport failure ends the cycle early and leaves every
//! remaining article untouched.

use chrono::Utc;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::time::Duration;

use crate::analyze::classifier::SentimentClassifier;
use crate::error::{CycleError, StoreError};
use crate::model::RetryPolicy;
use crate::store::{DynArticleStore, PendingQuery};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("analysis_attempts_total", "Classifier invocations.");
        describe_counter!("analysis_success_total", "Sentiments attached.");
        describe_counter!(
            "analysis_failures_total",
            "Failed classifications by error kind."
        );
        describe_counter!(
            "analysis_dead_letter_total",
            "Articles that reached the attempt cutoff."
        );
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub selected: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub dead_lettered: usize,
    /// Set when the cycle stopped early because the service was unreachable.
    pub service_unreachable: bool,
}

pub struct AnalysisWorker {
    classifier: SentimentClassifier,
    store: DynArticleStore,
    inter_call_delay: Duration,
    retry: RetryPolicy,
}

impl AnalysisWorker {
    pub fn new(
        classifier: SentimentClassifier,
        store: DynArticleStore,
        inter_call_delay: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            classifier,
            store,
            inter_call_delay,
            retry,
        }
    }

    /// Classify up to `batch_size` pending articles, oldest first.
    pub async fn run_once(&self, batch_size: usize) -> Result<AnalysisReport, CycleError> {
        ensure_metrics_described();

        if !self.classifier.is_enabled() {
            tracing::debug!(target: "analyze", "reasoning disabled, analysis skipped");
            return Ok(AnalysisReport::default());
        }

        let pending = self
            .store
            .find_unanalyzed(PendingQuery {
                limit: batch_size,
                now: Utc::now(),
                retry: self.retry,
            })
            .await?;

        let mut report = AnalysisReport {
            selected: pending.len(),
            ..AnalysisReport::default()
        };
        if pending.is_empty() {
            tracing::info!(target: "analyze", "no new articles to analyze");
            return Ok(report);
        }
        tracing::info!(target: "analyze", count = pending.len(), "articles to analyze");

        for (i, article) in pending.iter().enumerate() {
            if i > 0 && !self.inter_call_delay.is_zero() {
                tokio::time::sleep(self.inter_call_delay).await;
            }
            counter!("analysis_attempts_total").increment(1);

            match self.classifier.classify(&article.headline).await {
                Ok(record) => match self.store.attach_sentiment(article.id, record).await {
                    Ok(()) => {
                        report.analyzed += 1;
                        counter!("analysis_success_total").increment(1);
                        tracing::info!(target: "analyze", id = article.id, "analyzed and saved");
                    }
                    Err(StoreError::Unavailable(msg)) => {
                        return Err(CycleError::StorageUnavailable(msg))
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(target: "analyze", id = article.id, error = %e, "could not attach sentiment");
                    }
                },
                Err(e) => {
                    report.failed += 1;
                    counter!("analysis_failures_total", "kind" => e.kind()).increment(1);
                    if !e.is_headline_specific() {
                        report.service_unreachable = true;
                        tracing::warn!(
                            target: "analyze",
                            id = article.id,
                            error = %e,
                            "reasoning service unreachable, ending cycle early"
                        );
                        break;
                    }
                    tracing::warn!(
                        target: "analyze",
                        id = article.id,
                        kind = e.kind(),
                        error = %e,
                        "classification failed, left unanalyzed"
                    );
                    match self.store.record_failed_attempt(article.id, Utc::now()).await {
                        Ok(attempts) if attempts >= self.retry.max_attempts => {
                            report.dead_lettered += 1;
                            counter!("analysis_dead_letter_total").increment(1);
                            tracing::warn!(target: "analyze", id = article.id, attempts, "dead-lettered");
                        }
                        Ok(_) => {}
                        Err(StoreError::Unavailable(msg)) => {
                            return Err(CycleError::StorageUnavailable(msg))
                        }
                        Err(e) => {
                            tracing::warn!(target: "analyze", id = article.id, error = %e, "could not record attempt")
                        }
                    }
                }
            }
        }

        tracing::info!(
            target: "analyze",
            analyzed = report.analyzed,
            failed = report.failed,
            dead_lettered = report.dead_lettered,
            service_unreachable = report.service_unreachable,
            "analysis cycle complete"
        );
        Ok(report)
    }
}
