//! Search endpoints
//!
//! Threshold search (AND over per-label minimum counts, via query param or
//! POST body), existence search by species, and reverse thumbnail → record
//! lookup. The searches scan
//! the collection to exhaustion and return the full result partitioned by
//! file type.

use crate::error::{ApiError, ApiResult};
use crate::scan::scan_matching;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use birdtag_common::db::records::get_by_thumbnail;
use birdtag_common::db::{FileType, MediaRecord};
use birdtag_common::tags::TagCounts;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// One search hit
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub url: String,
    pub tag_counts: TagCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Search results partitioned by file type
///
/// Image entries carry their thumbnail url; videos and audio do not.
#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
    pub images: Vec<FileEntry>,
    pub videos: Vec<FileEntry>,
    pub audios: Vec<FileEntry>,
}

impl SearchResults {
    fn from_records(records: Vec<MediaRecord>) -> Self {
        let mut results = Self::default();
        for record in records {
            let entry = FileEntry {
                url: record.url,
                tag_counts: record.tag_counts,
                thumbnail_url: match record.file_type {
                    FileType::Image => record.thumbnail_url,
                    _ => None,
                },
            };
            match record.file_type {
                FileType::Image => results.images.push(entry),
                FileType::Video => results.videos.push(entry),
                FileType::Audio => results.audios.push(entry),
            }
        }
        results
    }
}

/// GET /api/search?tags={"crow":2,"pigeon":1}
///
/// Returns every record satisfying `count(label) >= min` for ALL supplied
/// pairs; an absent label counts as zero and fails the predicate.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<SearchResults>> {
    let raw = params
        .get("tags")
        .ok_or_else(|| ApiError::BadRequest("Missing tags parameter".to_string()))?;

    let parsed: Value = serde_json::from_str(raw)
        .map_err(|_| ApiError::BadRequest("Invalid tags JSON format".to_string()))?;

    let object = parsed
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Tags should be a JSON object".to_string()))?;

    let mut thresholds = HashMap::new();
    for (label, value) in object {
        let min = value.as_f64().ok_or_else(|| {
            ApiError::BadRequest(format!("Count for {} must be a number", label))
        })?;
        thresholds.insert(label.clone(), min);
    }

    let records = scan_matching(&state.db, |record| {
        record.tag_counts.meets_thresholds(&thresholds)
    })
    .await?;

    Ok(Json(SearchResults::from_records(records)))
}

/// GET /api/search-by-species?species=crow
///
/// Returns every record whose histogram contains the species key,
/// whatever its count.
pub async fn search_by_species(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<SearchResults>> {
    let species = params
        .get("species")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Species parameter is required".to_string()))?
        .clone();

    let records = scan_matching(&state.db, |record| record.tag_counts.contains(&species)).await?;

    Ok(Json(SearchResults::from_records(records)))
}

/// POST /api/file-based-search
///
/// Body-based variant of threshold search: `{tags: {"crow": 2, ...}}` in
/// the request body, same AND-over-minimums semantics and partitioned
/// response as GET /api/search.
pub async fn file_based_search(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<SearchResults>> {
    let payload: Value = serde_json::from_str(&body)
        .map_err(|_| ApiError::BadRequest("The request body contains invalid JSON format".to_string()))?;

    let tags = payload
        .get("tags")
        .ok_or_else(|| ApiError::BadRequest("Missing tags field in request".to_string()))?;

    let object = tags
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("tags must be a dictionary".to_string()))?;

    let mut thresholds = HashMap::new();
    for (label, value) in object {
        let min = value
            .as_f64()
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid count for {}", label)))?;
        thresholds.insert(label.clone(), min);
    }

    let records = scan_matching(&state.db, |record| {
        record.tag_counts.meets_thresholds(&thresholds)
    })
    .await?;

    Ok(Json(SearchResults::from_records(records)))
}

/// Reverse lookup response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedThumbnail {
    pub url: String,
    pub file_type: FileType,
    pub tag_counts: TagCounts,
}

/// GET /api/search-by-thumbnail?thumbnailUrl=...
///
/// Resolves a thumbnail url to its owning record; 404 when no record
/// carries that thumbnail.
pub async fn search_by_thumbnail(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ResolvedThumbnail>> {
    let thumbnail_url = params
        .get("thumbnailUrl")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("thumbnailUrl parameter is required".to_string()))?;

    let record = get_by_thumbnail(&state.db, thumbnail_url)
        .await?
        .ok_or_else(|| ApiError::NotFound("No matching file found".to_string()))?;

    Ok(Json(ResolvedThumbnail {
        url: record.url,
        file_type: record.file_type,
        tag_counts: record.tag_counts,
    }))
}
