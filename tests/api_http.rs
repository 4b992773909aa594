// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET/POST/DELETE /api/channels
// - POST /api/videos/analytics (ok, empty input, save under channel, no channel)
// - GET /api/analytics/{*channel_url} (found, not found)
// - POST /api/videos -> GET /api/progress -> GET /api/videos/latest

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use channel_insights::analytics::Aggregator;
use channel_insights::create_router;
use channel_insights::models::AnalyticsSummary;

use common::{sample_videos, test_state, StubFetcher};

const BODY_LIMIT: usize = 1024 * 1024;
const CHANNEL: &str = "https://www.youtube.com/@X";
// encodeURIComponent(CHANNEL), as the browser sends it
const CHANNEL_ENCODED: &str = "https%3A%2F%2Fwww.youtube.com%2F%40X";

fn test_router(dir: &std::path::Path) -> Router {
    create_router(test_state(
        Arc::new(StubFetcher::ok(sample_videos())),
        dir,
    ))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(req.body(body).expect("build request"))
        .await
        .expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Json::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Json::String("ok".into()));
}

#[tokio::test]
async fn channels_add_list_remove() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, body) = send(&app, "GET", "/api/channels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, "POST", "/api/channels", Some(json!({ "url": CHANNEL }))).await;
    assert_eq!(body, json!([{ "url": CHANNEL, "name": "@X" }]));

    // idempotent
    let (_, body) = send(&app, "POST", "/api/channels", Some(json!({ "url": CHANNEL }))).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "DELETE", "/api/channels", Some(json!({ "url": CHANNEL }))).await;
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, "POST", "/api/channels", Some(json!({ "url": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn compute_analytics_rejects_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, body) = send(
        &app,
        "POST",
        "/api/videos/analytics",
        Some(json!({ "videos": [], "channel_url": CHANNEL })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no videos to analyze");

    // nothing was saved
    let (status, _) = send(&app, "GET", &format!("/api/analytics/{CHANNEL_ENCODED}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compute_then_lookup_saved_analytics() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let videos = serde_json::to_value(sample_videos()).unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/videos/analytics",
        Some(json!({ "videos": videos, "channel_url": CHANNEL })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let computed: AnalyticsSummary = serde_json::from_value(body).expect("summary json");
    assert_eq!(
        computed,
        Aggregator::default().aggregate(&sample_videos()).unwrap()
    );

    let (status, body) = send(&app, "GET", &format!("/api/analytics/{CHANNEL_ENCODED}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let saved: AnalyticsSummary = serde_json::from_value(body).unwrap();
    assert_eq!(saved, computed);
}

#[tokio::test]
async fn compute_without_channel_returns_summary_but_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let videos = serde_json::to_value(sample_videos()).unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/videos/analytics",
        Some(json!({ "videos": videos })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("average_views").is_some());

    let (status, _) = send(&app, "GET", &format!("/api/analytics/{CHANNEL_ENCODED}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_channel_analytics_is_404_not_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());
    let (status, body) = send(&app, "GET", "/api/analytics/https%3A%2F%2Fnowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "No analytics found" }));
}

#[tokio::test]
async fn trigger_poll_and_fetch_latest_videos() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, body) = send(&app, "GET", "/api/progress", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "idle", "percent": 0, "message": "" }));

    let (_, body) = send(&app, "GET", "/api/videos/latest", None).await;
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, "POST", "/api/videos", Some(json!({ "url": CHANNEL }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "started");

    let mut last = json!(null);
    for _ in 0..400 {
        let (_, p) = send(&app, "GET", "/api/progress", None).await;
        if p["status"] == "done" || p["status"] == "error" {
            last = p;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(last["status"], "done", "progress: {last}");
    assert_eq!(last["percent"], 100);

    let (_, body) = send(&app, "GET", "/api/videos/latest", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(sample_videos().len()));
    assert_eq!(body[0]["id"], "v1");

    let (status, body) = send(&app, "GET", &format!("/api/analytics/{CHANNEL_ENCODED}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let saved: AnalyticsSummary = serde_json::from_value(body).unwrap();
    assert_eq!(
        saved,
        Aggregator::default().aggregate(&sample_videos()).unwrap()
    );
}
