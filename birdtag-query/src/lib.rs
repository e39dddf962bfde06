//! birdtag-query library - query, mutation, and deletion API
//!
//! Read side: threshold search, existence search, reverse thumbnail
//! lookup. Write side: bulk tag mutation and coordinated deletion. All
//! shared state lives in the media record store; handlers are stateless.

pub mod api;
pub mod error;
pub mod scan;

pub use crate::error::{ApiError, ApiResult};

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use birdtag_common::blob::BlobStore;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Media record store connection pool
    pub db: SqlitePool,
    /// Blob store client, used by deletion
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(db: SqlitePool, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }
}

/// Build application router
///
/// Explicit routing table validated at startup; unknown (path, method)
/// combinations get a structured error body instead of a bare default.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", get(api::search))
        .route("/api/search-by-species", get(api::search_by_species))
        .route("/api/search-by-thumbnail", get(api::search_by_thumbnail))
        .route("/api/file-based-search", post(api::file_based_search))
        .route("/api/tags", post(api::manage_tags))
        .route("/api/delete-files", post(api::delete_files))
        .route("/health", get(api::health))
        .fallback(unknown_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn unknown_route() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid request" })))
}
