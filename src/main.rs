//! Market news feed binary entrypoint.
//! Boots the Axum HTTP server, the storage handle, the scrapers and the
//! periodic ingestion/analysis scheduler.

use market_news_feed::{
    bootstrap::FeedRuntime,
    config::FeedConfig,
    metrics::Metrics,
    store::{DynArticleStore, MemoryArticleStore},
};
use shuttle_axum::ShuttleAxum;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// JSON logs when `LOG_FORMAT=json`, compact otherwise. No-op if the runtime
/// already installed a subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_news_feed=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = %e, "prometheus recorder not installed");
            None
        }
    };

    let cfg = FeedConfig::load_default()?;
    let store: DynArticleStore = Arc::new(MemoryArticleStore::new());
    let runtime = FeedRuntime::from_config(cfg, store)?;
    runtime.quick_probe().await;

    let (router, scheduler) = runtime.start(metrics.as_ref());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            scheduler.shutdown().await;
        }
    });

    Ok(router.into())
}
