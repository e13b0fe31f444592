// src/api.rs
//! Thin HTTP surface over [`NewsFeed`]. Authentication is handled upstream;
//! the filtered feed takes the caller's portfolio in the request body.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::CycleError;
use crate::feed::NewsFeed;
use crate::portfolio::{portfolio_keywords, PortfolioEntry};

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<NewsFeed>,
    pub list_limit: usize,
    pub default_batch_size: usize,
}

impl AppState {
    pub fn new(feed: Arc<NewsFeed>, list_limit: usize, default_batch_size: usize) -> Self {
        Self {
            feed,
            list_limit,
            default_batch_size,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news/general", get(news_general))
        .route("/api/news/filtered", post(news_filtered))
        .route("/admin/ingest", post(admin_ingest))
        .route("/admin/analyze", post(admin_analyze))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

fn effective_limit(requested: Option<usize>, max: usize) -> usize {
    requested.map(|l| l.clamp(1, max)).unwrap_or(max)
}

async fn news_general(State(state): State<AppState>, Query(q): Query<LimitQuery>) -> Response {
    let limit = effective_limit(q.limit, state.list_limit);
    Json(state.feed.list_recent(limit).await).into_response()
}

#[derive(Deserialize, Default)]
struct FilteredReq {
    #[serde(default)]
    portfolio: Vec<PortfolioEntry>,
    /// Manually entered tickers; each is its own keyword.
    #[serde(default)]
    symbols: Vec<String>,
    limit: Option<usize>,
}

async fn news_filtered(State(state): State<AppState>, Json(body): Json<FilteredReq>) -> Response {
    let mut entries = body.portfolio;
    entries.extend(body.symbols.iter().map(|s| PortfolioEntry::from_symbol(s)));
    let keywords: BTreeSet<String> = portfolio_keywords(&entries);
    let limit = effective_limit(body.limit, state.list_limit);
    Json(state.feed.list_matching(&keywords, limit).await).into_response()
}

fn cycle_error_response(e: CycleError) -> Response {
    let status = match e {
        CycleError::AlreadyRunning(_) => StatusCode::CONFLICT,
        CycleError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

async fn admin_ingest(State(state): State<AppState>) -> Response {
    match state.feed.run_ingestion_report().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => cycle_error_response(e),
    }
}

#[derive(Deserialize)]
struct AnalyzeQuery {
    batch_size: Option<usize>,
}

async fn admin_analyze(State(state): State<AppState>, Query(q): Query<AnalyzeQuery>) -> Response {
    let batch = q.batch_size.unwrap_or(state.default_batch_size).max(1);
    match state.feed.run_analysis_cycle(batch).await {
        Ok(analyzed) => Json(serde_json::json!({ "analyzed": analyzed })).into_response(),
        Err(e) => cycle_error_response(e),
    }
}
