use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::ingest;
use crate::ingest::types::FeedFetcher;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub fetcher: Arc<dyn FeedFetcher>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/import", post(trigger_import))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ImportReq {
    /// Distinguishes the admin "Import now" button from scheduled runs,
    /// for logging only.
    #[serde(default)]
    pub manual: bool,
}

#[derive(serde::Serialize)]
struct ImportOk {
    success: bool,
    imported: usize,
    sources_processed: usize,
}

#[derive(serde::Serialize)]
struct ImportErr {
    success: bool,
    error: String,
}

/// Trigger one ingestion cycle. Per-source errors are invisible here by
/// design (they only show up in logs); a fatal run error becomes a 500.
async fn trigger_import(State(state): State<AppState>, body: Bytes) -> Response {
    // The body is optional; anything that does not parse as the request
    // shape is treated as the default request.
    let manual = serde_json::from_slice::<ImportReq>(&body)
        .map(|req| req.manual)
        .unwrap_or_default();

    match ingest::run_import(state.store.as_ref(), state.fetcher.as_ref(), manual).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ImportOk {
                success: true,
                imported: summary.imported,
                sources_processed: summary.sources_processed,
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = ?err, "import run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ImportErr {
                    success: false,
                    error: format!("{err:#}"),
                }),
            )
                .into_response()
        }
    }
}
