//! Batch ingest endpoint

use crate::error::{ApiError, ApiResult};
use crate::types::{IngestRequest, IngestResponse};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use tracing::info;

/// POST /api/ingest
///
/// Consumes a batch of file-arrival notifications `{events: [{bucket,
/// key}]}` and runs each through the pipeline. Always returns 200 with
/// per-item outcomes; a single bad file never fails the batch.
pub async fn ingest_batch(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<IngestResponse>> {
    let request: IngestRequest = serde_json::from_str(&body)
        .map_err(|_| ApiError::BadRequest("The request body contains invalid JSON format".to_string()))?;

    if request.events.is_empty() {
        return Err(ApiError::BadRequest("events must be a non-empty list".to_string()));
    }

    info!("Ingesting batch of {} events", request.events.len());
    let response = state.pipeline.process_batch(&request.events).await;

    Ok(Json(response))
}
