//! Ingestion pipeline
//!
//! Per file: classify → download → detect → aggregate → (images:
//! thumbnail) → persist. Every external call is bounded by a timeout and
//! every per-file error is isolated: one bad file never aborts its
//! siblings in the batch.

use crate::detector::Detector;
use crate::thumbnail::Thumbnailer;
use crate::types::{classify_key, key_extension, IngestEvent, IngestResponse, ItemFailure, PersistedItem};
use birdtag_common::blob::BlobStore;
use birdtag_common::db::{self, FileType, MediaRecord};
use birdtag_common::tags::aggregate;
use birdtag_common::{Error, Result};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Orchestrates detect → aggregate → thumbnail → persist per file event
pub struct IngestPipeline {
    db: SqlitePool,
    detector: Arc<dyn Detector>,
    blobs: Arc<dyn BlobStore>,
    thumbnailer: Arc<dyn Thumbnailer>,
    confidence_threshold: f32,
    op_timeout: Duration,
}

impl IngestPipeline {
    pub fn new(
        db: SqlitePool,
        detector: Arc<dyn Detector>,
        blobs: Arc<dyn BlobStore>,
        thumbnailer: Arc<dyn Thumbnailer>,
        confidence_threshold: f32,
        op_timeout: Duration,
    ) -> Self {
        Self {
            db,
            detector,
            blobs,
            thumbnailer,
            confidence_threshold,
            op_timeout,
        }
    }

    /// Process a batch of file-arrival events, one outcome per event
    pub async fn process_batch(&self, events: &[IngestEvent]) -> IngestResponse {
        let mut response = IngestResponse::default();

        for event in events {
            match self.process_event(event).await {
                Ok(url) => {
                    info!("Persisted {} from {}/{}", url, event.bucket, event.key);
                    response.persisted.push(PersistedItem {
                        bucket: event.bucket.clone(),
                        key: event.key.clone(),
                        url,
                    });
                }
                Err(Error::Unsupported(_)) => {
                    warn!("Skipping unsupported file {}/{}", event.bucket, event.key);
                    response.skipped.push(ItemFailure {
                        bucket: event.bucket.clone(),
                        key: event.key.clone(),
                        reason: "Unsupported file type".to_string(),
                    });
                }
                Err(e) => {
                    warn!("Ingestion of {}/{} failed: {}", event.bucket, event.key, e);
                    response.failed.push(ItemFailure {
                        bucket: event.bucket.clone(),
                        key: event.key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        response
    }

    /// Run one event through the full state machine, returning the
    /// canonical url of the persisted record
    async fn process_event(&self, event: &IngestEvent) -> Result<String> {
        let file_type = classify_key(&event.key)?;

        let media = self
            .bounded("Blob download", self.blobs.get(&event.bucket, &event.key))
            .await?;

        let detections = self
            .bounded("Detection", self.detector.detect(file_type, &media))
            .await?;

        // Confidence gate happens before aggregation; low-confidence
        // detections are discarded entirely.
        let labels = detections
            .into_iter()
            .filter(|d| d.confidence >= self.confidence_threshold)
            .map(|d| d.label);
        let tag_counts = aggregate(labels);

        let mut record = MediaRecord::new(
            self.blobs.object_url(&event.bucket, &event.key),
            file_type,
            tag_counts,
        );

        if file_type == FileType::Image {
            match self.generate_thumbnail(event, &media).await {
                Ok(url) => record.thumbnail_url = Some(url),
                Err(e) => {
                    // Record persists without a thumbnail url
                    warn!("Thumbnail generation for {} failed: {}", event.key, e);
                }
            }
        }

        db::records::upsert_record(&self.db, &record).await?;
        Ok(record.url)
    }

    /// Generate and store the derived thumbnail, returning its url
    async fn generate_thumbnail(&self, event: &IngestEvent, media: &[u8]) -> Result<String> {
        let extension = key_extension(&event.key).unwrap_or_else(|| "jpg".to_string());

        let thumbnail = self
            .bounded("Thumbnail generation", self.thumbnailer.thumbnail(media, &extension))
            .await?;

        let file_name = event.key.rsplit('/').next().unwrap_or(&event.key);
        let thumb_key = format!("thumbnails/{}", file_name);

        self.bounded(
            "Thumbnail upload",
            self.blobs.put(
                &event.bucket,
                &thumb_key,
                thumbnail,
                content_type_for_extension(&extension),
            ),
        )
        .await?;

        Ok(self.blobs.object_url(&event.bucket, &thumb_key))
    }

    /// Bound an external call by the configured timeout
    async fn bounded<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| Error::Dependency(format!("{} timed out after {:?}", what, self.op_timeout)))?
    }
}

fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
