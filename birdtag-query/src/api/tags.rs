//! Bulk tag mutation endpoint
//!
//! Applies additive or subtractive tag deltas across a batch of records.
//! Each write is a version-checked compare-and-swap with bounded retry, so
//! concurrent mutations of the same record never lose updates.

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use birdtag_common::db::records::{resolve_url, update_tag_counts_cas};
use birdtag_common::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

const MAX_CAS_ATTEMPTS: u32 = 5;

/// Tag mutation direction: body field `operation` is 1 (add) or 0 (remove)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOperation {
    Add,
    Remove,
}

/// Per-url failure entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlFailure {
    pub url: String,
    pub reason: String,
}

/// Mutation response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateResponse {
    pub message: String,
    pub updated_urls: Vec<String>,
    pub updated_count: usize,
    pub failed: Vec<UrlFailure>,
}

/// POST /api/tags
///
/// Body: `{urls: [string], operation: 1|0, tags: ["label,delta", ...]}`.
/// Urls may be canonical or thumbnail urls. Entries with an unparseable or
/// negative delta are skipped. Each url is processed independently.
pub async fn manage_tags(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<MutateResponse>> {
    let payload: Value = serde_json::from_str(&body)
        .map_err(|_| ApiError::BadRequest("The request body contains invalid JSON format".to_string()))?;

    let urls = parse_urls(&payload)?;
    let operation = parse_operation(&payload)?;
    let entries = parse_entries(&payload)?;

    let mut updated_urls = Vec::new();
    let mut failed = Vec::new();

    for url in urls {
        match apply_mutation(&state.db, &url, operation, &entries).await {
            Ok(()) => updated_urls.push(url),
            Err(Error::NotFound(_)) => failed.push(UrlFailure {
                url,
                reason: "Not found in DB".to_string(),
            }),
            Err(e) => {
                warn!("Tag mutation for {} failed: {}", url, e);
                failed.push(UrlFailure {
                    url,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(Json(MutateResponse {
        message: "Batch labeling operation completed".to_string(),
        updated_count: updated_urls.len(),
        updated_urls,
        failed,
    }))
}

fn parse_urls(payload: &Value) -> ApiResult<Vec<String>> {
    let array = payload
        .get("urls")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ApiError::BadRequest("urls must be a list".to_string()))?;

    array
        .iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| ApiError::BadRequest("urls must be a list of strings".to_string()))
        })
        .collect()
}

fn parse_operation(payload: &Value) -> ApiResult<TagOperation> {
    match payload.get("operation").and_then(|v| v.as_i64()) {
        Some(1) => Ok(TagOperation::Add),
        Some(0) => Ok(TagOperation::Remove),
        _ => Err(ApiError::BadRequest("operation must be 0 or 1".to_string())),
    }
}

/// Parse `"label,delta"` entries, skipping malformed ones
///
/// Labels are trimmed and lowercased; a negative or unparseable delta
/// drops the entry rather than failing the request.
fn parse_entries(payload: &Value) -> ApiResult<Vec<(String, u64)>> {
    let array = payload
        .get("tags")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ApiError::BadRequest("tags must be a list".to_string()))?;

    let mut entries = Vec::new();
    for raw in array {
        let Some(text) = raw.as_str() else {
            continue;
        };
        let Some((label, delta)) = text.split_once(',') else {
            continue;
        };
        let label = label.trim().to_lowercase();
        if label.is_empty() || delta.contains(',') {
            continue;
        }
        match delta.trim().parse::<i64>() {
            Ok(delta) if delta >= 0 => entries.push((label, delta as u64)),
            _ => continue,
        }
    }
    Ok(entries)
}

/// Read-modify-write one record under optimistic concurrency
async fn apply_mutation(
    pool: &SqlitePool,
    url: &str,
    operation: TagOperation,
    entries: &[(String, u64)],
) -> Result<()> {
    for _ in 0..MAX_CAS_ATTEMPTS {
        let record = resolve_url(pool, url)
            .await?
            .ok_or_else(|| Error::NotFound(url.to_string()))?;

        let mut counts = record.tag_counts.clone();
        for (label, delta) in entries {
            match operation {
                TagOperation::Add => counts.add(label, *delta),
                TagOperation::Remove => counts.remove(label, *delta),
            }
        }

        if update_tag_counts_cas(pool, &record.url, record.version, &counts).await? {
            return Ok(());
        }
        // Version moved under us; re-read and retry
    }

    Err(Error::Internal(format!(
        "Concurrent update conflict after {} attempts",
        MAX_CAS_ATTEMPTS
    )))
}
