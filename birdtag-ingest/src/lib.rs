//! birdtag-ingest library interface
//!
//! Exposes the router and pipeline for integration testing.

pub mod api;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod thumbnail;
pub mod types;

pub use crate::error::{ApiError, ApiResult};
pub use crate::pipeline::IngestPipeline;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestPipeline>) -> Self {
        Self { pipeline }
    }
}

/// Build application router
///
/// Explicit routing table validated at startup; unknown (path, method)
/// combinations get a structured error body instead of a bare default.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/ingest", post(api::ingest_batch))
        .route("/health", get(api::health))
        .fallback(unknown_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn unknown_route() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid request" })))
}
