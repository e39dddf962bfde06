//! Coordinated deletion endpoint
//!
//! Removes the primary blob, the derived thumbnail (best effort), and the
//! record, in that order. Every sub-operation outcome is surfaced per url;
//! partial failure never aborts the batch.

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use birdtag_common::blob::parse_object_url;
use birdtag_common::db::records::{delete_record, resolve_url};
use birdtag_common::db::FileType;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Fully deleted record with the blob urls that were removed
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedItem {
    pub url: String,
    pub deleted_blobs: Vec<String>,
}

/// Per-url failure entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFailure {
    pub url: String,
    pub reason: String,
}

/// Deletion response
#[derive(Debug, Default, Serialize)]
pub struct DeleteResponse {
    pub deleted: Vec<DeletedItem>,
    pub failed: Vec<DeleteFailure>,
}

/// POST /api/delete-files
///
/// Body: `{urls: [string]}`, each either a canonical or a thumbnail url.
pub async fn delete_files(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<DeleteResponse>> {
    let payload: Value = serde_json::from_str(&body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;

    let urls = match payload.get("urls").and_then(|v| v.as_array()) {
        Some(array) if !array.is_empty() => array,
        _ => return Err(ApiError::BadRequest("urls must be a non-empty list".to_string())),
    };

    let mut response = DeleteResponse::default();

    for raw in urls {
        let Some(url) = raw.as_str() else {
            return Err(ApiError::BadRequest("urls must be a list of strings".to_string()));
        };

        let record = match resolve_url(&state.db, url).await? {
            Some(record) => record,
            None => {
                response.failed.push(DeleteFailure {
                    url: url.to_string(),
                    reason: "Not found in DB".to_string(),
                });
                continue;
            }
        };

        let mut deleted_blobs = Vec::new();

        // Primary blob delete is required; on failure, dependent steps
        // still run so the record does not linger.
        match delete_blob(&state, &record.url).await {
            Ok(()) => deleted_blobs.push(record.url.clone()),
            Err(reason) => {
                warn!("Primary blob delete for {} failed: {}", record.url, reason);
                response.failed.push(DeleteFailure {
                    url: record.url.clone(),
                    reason,
                });
            }
        }

        // Thumbnail delete is best effort: recorded, never blocking
        if record.file_type == FileType::Image {
            if let Some(thumbnail_url) = &record.thumbnail_url {
                match delete_blob(&state, thumbnail_url).await {
                    Ok(()) => deleted_blobs.push(thumbnail_url.clone()),
                    Err(reason) => {
                        warn!("Thumbnail blob delete for {} failed: {}", thumbnail_url, reason);
                        response.failed.push(DeleteFailure {
                            url: thumbnail_url.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        // Record goes last so a blob failure leaves it discoverable
        match delete_record(&state.db, &record.url).await {
            Ok(_) => response.deleted.push(DeletedItem {
                url: record.url,
                deleted_blobs,
            }),
            Err(e) => response.failed.push(DeleteFailure {
                url: url.to_string(),
                reason: format!("DB delete failed: {}", e),
            }),
        }
    }

    Ok(Json(response))
}

async fn delete_blob(state: &AppState, blob_url: &str) -> Result<(), String> {
    let (bucket, key) = parse_object_url(blob_url).map_err(|e| e.to_string())?;
    state
        .blobs
        .delete(&bucket, &key)
        .await
        .map_err(|e| e.to_string())
}
