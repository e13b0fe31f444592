// src/scheduler.rs
//! Periodic trigger for ingestion + analysis, with a single-flight guard per
//! cycle kind so overlapping triggers are skipped instead of interleaved.

use metrics::counter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::feed::NewsFeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Ingestion,
    Analysis,
}

impl CycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::Ingestion => "ingestion",
            CycleKind::Analysis => "analysis",
        }
    }
}

/// In-progress flags, one per cycle kind.
#[derive(Debug, Default)]
pub struct CycleGuard {
    ingestion: AtomicBool,
    analysis: AtomicBool,
}

/// Held while a cycle runs; releases the flag on drop.
#[derive(Debug)]
pub struct CycleToken<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CycleToken<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, kind: CycleKind) -> &AtomicBool {
        match kind {
            CycleKind::Ingestion => &self.ingestion,
            CycleKind::Analysis => &self.analysis,
        }
    }

    /// `None` when a cycle of this kind is already running.
    pub fn try_acquire(&self, kind: CycleKind) -> Option<CycleToken<'_>> {
        let flag = self.flag(kind);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleToken { flag })
    }

    pub fn is_running(&self, kind: CycleKind) -> bool {
        self.flag(kind).load(Ordering::Acquire)
    }
}

pub(crate) fn record_skip(kind: CycleKind) {
    counter!("scheduler_skipped_total", "cycle" => kind.as_str()).increment(1);
    tracing::warn!(target: "scheduler", cycle = kind.as_str(), "previous cycle still running, trigger skipped");
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
    pub batch_size: usize,
    pub run_on_startup: bool,
}

/// Running scheduler task plus its stop signal.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop triggering new ticks. Cycles already started run to completion.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(target: "scheduler", error = ?e, "scheduler task ended abnormally");
        }
    }
}

/// One tick: scrape, then analyze. Errors are logged; the next tick retries.
pub async fn tick(feed: &NewsFeed, batch_size: usize) {
    match feed.run_ingestion_cycle().await {
        Ok(n) => tracing::info!(target: "scheduler", inserted = n, "ingestion tick"),
        Err(e) => tracing::warn!(target: "scheduler", error = %e, "ingestion tick failed"),
    }
    match feed.run_analysis_cycle(batch_size).await {
        Ok(n) => tracing::info!(target: "scheduler", analyzed = n, "analysis tick"),
        Err(e) => tracing::warn!(target: "scheduler", error = %e, "analysis tick failed"),
    }
}

/// Spawn the periodic loop. The first tick fires immediately when
/// `run_on_startup` is set, otherwise after one interval.
pub fn spawn_scheduler(feed: Arc<NewsFeed>, cfg: SchedulerCfg) -> SchedulerHandle {
    let (stop, mut stop_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let start = if cfg.run_on_startup {
            tokio::time::Instant::now()
        } else {
            tokio::time::Instant::now() + cfg.interval
        };
        let mut ticker = tokio::time::interval_at(start, cfg.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Spawned so a slow tick never blocks the next trigger;
                    // the cycle guard turns overlaps into skips.
                    let feed = Arc::clone(&feed);
                    tokio::spawn(async move { tick(&feed, cfg.batch_size).await });
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        tracing::info!(target: "scheduler", "scheduler stopped");
                        break;
                    }
                }
            }
        }
    });
    SchedulerHandle { stop, task }
}
