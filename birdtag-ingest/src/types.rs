//! Ingestion wire types and media classification

use birdtag_common::db::FileType;
use birdtag_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// One file-arrival notification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestEvent {
    pub bucket: String,
    pub key: String,
}

/// Batch ingest request body
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub events: Vec<IngestEvent>,
}

/// Successfully persisted item
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedItem {
    pub bucket: String,
    pub key: String,
    /// Canonical record url
    pub url: String,
}

/// Per-item skip or failure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub bucket: String,
    pub key: String,
    pub reason: String,
}

/// Batch ingest response, one outcome per input event
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub persisted: Vec<PersistedItem>,
    pub skipped: Vec<ItemFailure>,
    pub failed: Vec<ItemFailure>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a", "aac"];

/// Classify an object key as image, video, or audio
///
/// Key prefix wins (`images/`, `videos/`, `audio/`), falling back to the
/// file extension. Anything else is rejected as unsupported; the caller
/// skips the item without failing its batch.
pub fn classify_key(key: &str) -> Result<FileType> {
    if key.starts_with("images/") {
        return Ok(FileType::Image);
    }
    if key.starts_with("videos/") {
        return Ok(FileType::Video);
    }
    if key.starts_with("audio/") {
        return Ok(FileType::Audio);
    }

    if let Some(ext) = key_extension(key) {
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(FileType::Image);
        }
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(FileType::Video);
        }
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(FileType::Audio);
        }
    }

    Err(Error::Unsupported(key.to_string()))
}

/// Lowercased file extension of an object key, if any
pub fn key_extension(key: &str) -> Option<String> {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
