// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /import  (empty body, JSON body, fatal backend failure)

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use veille_import::api::{self, AppState};
use veille_import::store::memory::MemoryStore;
use veille_import::store::Store;
use veille_import::{FeedFetcher, NewItem, RawItem, Source};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct NoopFetcher;

#[async_trait]
impl FeedFetcher for NoopFetcher {
    async fn fetch(&self, _source: &Source) -> Result<Vec<RawItem>> {
        Ok(Vec::new())
    }
}

/// Build the same Router the binary uses.
fn test_router(store: Arc<dyn Store>) -> Router {
    api::router(AppState {
        store,
        fetcher: Arc::new(NoopFetcher),
    })
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(Arc::new(MemoryStore::new()));

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_import_with_empty_registry_succeeds_with_zero_counts() {
    let app = test_router(Arc::new(MemoryStore::new()));

    // The body is optional; a bare POST triggers a run too.
    let req = Request::builder()
        .method("POST")
        .uri("/import")
        .body(Body::empty())
        .expect("build POST /import");

    let resp = app.oneshot(req).await.expect("oneshot /import");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse import json");
    assert_eq!(v.get("success"), Some(&Json::Bool(true)));
    assert_eq!(v.get("imported").and_then(Json::as_u64), Some(0));
    assert_eq!(v.get("sources_processed").and_then(Json::as_u64), Some(0));
}

#[tokio::test]
async fn api_import_accepts_manual_flag_body() {
    let app = test_router(Arc::new(MemoryStore::new()));

    let req = Request::builder()
        .method("POST")
        .uri("/import")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "manual": true }).to_string()))
        .expect("build POST /import");

    let resp = app.oneshot(req).await.expect("oneshot /import");
    assert_eq!(resp.status(), StatusCode::OK);
}

/// A backend that cannot even list sources: the run has to fail as a whole
/// and surface a 500 with the error shape the admin panel expects.
struct UnreachableStore;

#[async_trait]
impl Store for UnreachableStore {
    async fn active_sources(&self) -> Result<Vec<Source>> {
        anyhow::bail!("backend unreachable")
    }
    async fn item_exists(&self, _url: &str) -> Result<bool> {
        anyhow::bail!("backend unreachable")
    }
    async fn insert_items(&self, _items: &[NewItem]) -> Result<usize> {
        anyhow::bail!("backend unreachable")
    }
    async fn mark_synced(&self, _source_id: &str, _ts: chrono::DateTime<chrono::Utc>) -> Result<()> {
        anyhow::bail!("backend unreachable")
    }
}

#[tokio::test]
async fn api_import_fatal_failure_returns_500_error_shape() {
    let app = test_router(Arc::new(UnreachableStore));

    let req = Request::builder()
        .method("POST")
        .uri("/import")
        .body(Body::empty())
        .expect("build POST /import");

    let resp = app.oneshot(req).await.expect("oneshot /import");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read json")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).expect("parse error json");
    assert_eq!(v.get("success"), Some(&Json::Bool(false)));
    let error = v.get("error").and_then(Json::as_str).unwrap_or_default();
    assert!(error.contains("backend unreachable"), "got error: {error}");
}
