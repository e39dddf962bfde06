//! Media record persistence
//!
//! One row per uploaded media object, keyed by canonical URL. Re-ingestion
//! replaces the whole tag histogram (last write wins); tag mutations go
//! through a version-checked compare-and-swap so concurrent updates on the
//! same record never lose writes.

use crate::tags::TagCounts;
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;

/// Media classification, fixed at record creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
    Audio,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Video => "video",
            FileType::Audio => "audio",
        }
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(FileType::Image),
            "video" => Ok(FileType::Video),
            "audio" => Ok(FileType::Audio),
            other => Err(Error::Unsupported(other.to_string())),
        }
    }
}

/// The persisted unit describing one uploaded file's detected tags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    /// Canonical locator of the original blob, primary key
    pub url: String,
    pub file_type: FileType,
    pub tag_counts: TagCounts,
    /// Present only for images with a generated thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Optimistic-concurrency counter, not exposed on the wire
    #[serde(skip)]
    pub version: i64,
}

impl MediaRecord {
    pub fn new(url: String, file_type: FileType, tag_counts: TagCounts) -> Self {
        Self {
            url,
            file_type,
            tag_counts,
            thumbnail_url: None,
            version: 0,
        }
    }
}

fn record_from_row(row: &SqliteRow) -> Result<MediaRecord> {
    let file_type_str: String = row.get("file_type");
    let file_type = FileType::from_str(&file_type_str)
        .map_err(|_| Error::Internal(format!("Corrupt file_type in store: {}", file_type_str)))?;

    let counts_json: String = row.get("tag_counts");
    let raw: HashMap<String, u64> = serde_json::from_str(&counts_json)
        .map_err(|e| Error::Internal(format!("Corrupt tag_counts in store: {}", e)))?;

    Ok(MediaRecord {
        url: row.get("url"),
        file_type,
        tag_counts: TagCounts::from_map(raw),
        thumbnail_url: row.get("thumbnail_url"),
        version: row.get("version"),
    })
}

fn counts_to_json(counts: &TagCounts) -> Result<String> {
    serde_json::to_string(counts)
        .map_err(|e| Error::Internal(format!("Tag counts serialization failed: {}", e)))
}

/// Insert or fully replace a media record
///
/// Reprocessing the same url REPLACES its tag histogram (last write wins).
/// `file_type` is immutable and left untouched on conflict.
pub async fn upsert_record(pool: &SqlitePool, record: &MediaRecord) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO media_records (url, file_type, tag_counts, thumbnail_url, version, created_at, updated_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        ON CONFLICT(url) DO UPDATE SET
            tag_counts = excluded.tag_counts,
            thumbnail_url = excluded.thumbnail_url,
            version = media_records.version + 1,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&record.url)
    .bind(record.file_type.as_str())
    .bind(counts_to_json(&record.tag_counts)?)
    .bind(&record.thumbnail_url)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a record by canonical url
pub async fn get_by_url(pool: &SqlitePool, url: &str) -> Result<Option<MediaRecord>> {
    let row = sqlx::query(
        "SELECT url, file_type, tag_counts, thumbnail_url, version FROM media_records WHERE url = ?",
    )
    .bind(url)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Load the single record owning a thumbnail url
pub async fn get_by_thumbnail(pool: &SqlitePool, thumbnail_url: &str) -> Result<Option<MediaRecord>> {
    let row = sqlx::query(
        "SELECT url, file_type, tag_counts, thumbnail_url, version FROM media_records WHERE thumbnail_url = ?",
    )
    .bind(thumbnail_url)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Resolve a client-supplied url that may be either a canonical url or a
/// thumbnail url to the owning record
pub async fn resolve_url(pool: &SqlitePool, url: &str) -> Result<Option<MediaRecord>> {
    if let Some(record) = get_by_url(pool, url).await? {
        return Ok(Some(record));
    }
    get_by_thumbnail(pool, url).await
}

/// Load one page of the collection for linear-scan queries
///
/// The backing store has no compound index on tag keys, so search is a
/// paged scan with predicate evaluation at the caller.
pub async fn scan_page(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<MediaRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT url, file_type, tag_counts, thumbnail_url, version
        FROM media_records
        ORDER BY url
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Conditionally replace a record's tag histogram
///
/// The swap lands only when the stored version still equals
/// `expected_version`. Returns false on conflict; the caller re-reads and
/// retries. This is what prevents lost updates between concurrent
/// mutations of the same record.
pub async fn update_tag_counts_cas(
    pool: &SqlitePool,
    url: &str,
    expected_version: i64,
    counts: &TagCounts,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE media_records
        SET tag_counts = ?, version = version + 1, updated_at = ?
        WHERE url = ? AND version = ?
        "#,
    )
    .bind(counts_to_json(counts)?)
    .bind(Utc::now().to_rfc3339())
    .bind(url)
    .bind(expected_version)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete a record by canonical url, returning whether a row was removed
pub async fn delete_record(pool: &SqlitePool, url: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM media_records WHERE url = ?")
        .bind(url)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}
