//! Species detector adapter
//!
//! The detection model is an external capability. For images the service
//! returns one detection per object in the frame; for videos it returns one
//! detection per object per frame (tracking only maintains identity across
//! frames, counts stay frame-level); for audio the shape is identical with
//! a different underlying model.

use async_trait::async_trait;
use birdtag_common::db::FileType;
use birdtag_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// One detected label with model confidence
#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

/// Detection capability contract
#[async_trait]
pub trait Detector: Send + Sync {
    /// Run the model over one media object and return every detection
    async fn detect(&self, kind: FileType, media: &[u8]) -> Result<Vec<Detection>>;
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    detections: Vec<Detection>,
}

/// Detector client speaking HTTP to the model service
pub struct HttpDetector {
    client: reqwest::Client,
    url: String,
}

impl HttpDetector {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Detector client init failed: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, kind: FileType, media: &[u8]) -> Result<Vec<Detection>> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("kind", kind.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(media.to_vec())
            .send()
            .await
            .map_err(|e| Error::Dependency(format!("Detector call failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "Detector call failed: HTTP {}",
                response.status()
            )));
        }

        let parsed: DetectResponse = response
            .json()
            .await
            .map_err(|e| Error::Dependency(format!("Detector response malformed: {}", e)))?;

        Ok(parsed.detections)
    }
}
