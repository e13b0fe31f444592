// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value as Json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt as _;

use market_news_feed::ai_adapter::MockReasoningClient;
use market_news_feed::analyze::{AnalysisWorker, SentimentClassifier};
use market_news_feed::api::{self, AppState};
use market_news_feed::feed::NewsFeed;
use market_news_feed::model::{HeadlineRecord, RetryPolicy};
use market_news_feed::store::{ArticleStore, DynArticleStore, MemoryArticleStore};

const BODY_LIMIT: usize = 1024 * 1024;

async fn test_router() -> Router {
    let store = Arc::new(MemoryArticleStore::new());
    let now = Utc::now();
    for (i, h) in ["Tata Steel expands", "HDFC Bank Q2", "TCS hiring freeze"].iter().enumerate() {
        store
            .insert(
                HeadlineRecord {
                    headline: h.to_string(),
                    url: format!("https://news.test/{i}"),
                    source: "Test".into(),
                },
                Some(now - ChronoDuration::minutes(10 - i as i64)),
            )
            .await
            .unwrap();
    }
    let dyn_store: DynArticleStore = store;
    let worker = AnalysisWorker::new(
        SentimentClassifier::new(Arc::new(MockReasoningClient::fixed(
            r#"{"impact":"Negative","reasoning":"Hiring freeze","confidence":0.6}"#,
        ))),
        Arc::clone(&dyn_store),
        Duration::ZERO,
        RetryPolicy::default(),
    );
    let feed = Arc::new(NewsFeed::new(dyn_store, vec![], worker));
    api::router(AppState::new(feed, 50, 10))
}

async fn json_body(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router().await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn general_news_is_newest_first_and_limited() {
    let app = test_router().await;
    let req = Request::builder()
        .uri("/api/news/general?limit=2")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    let arr = v.as_array().expect("array");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["headline"], "TCS hiring freeze");
    assert!(arr[0].get("publishedAt").is_some());
    assert!(arr[0].get("sentiment").is_none());
}

#[tokio::test]
async fn filtered_news_matches_portfolio_and_symbols() {
    let app = test_router().await;
    let payload = json!({
        "portfolio": [{ "symbol": "TATASTEEL", "keywords": ["TATASTEEL", "TATA", "STEEL"] }],
        "symbols": ["hdfcbank", "tcs"]
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/news/filtered")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    let heads: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["headline"].as_str())
        .collect();
    // "HDFCBANK" does not occur in "HDFC Bank Q2"
    assert_eq!(heads, vec!["TCS hiring freeze", "Tata Steel expands"]);
}

#[tokio::test]
async fn filtered_news_with_empty_portfolio_is_empty() {
    let app = test_router().await;
    let req = Request::builder()
        .method("POST")
        .uri("/api/news/filtered")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!([]));
}

#[tokio::test]
async fn admin_cycles_report_counts() {
    let app = test_router().await;

    let req = Request::builder()
        .method("POST")
        .uri("/admin/ingest")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["inserted"], 0);

    let req = Request::builder()
        .method("POST")
        .uri("/admin/analyze?batch_size=2")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["analyzed"], 2);
}
