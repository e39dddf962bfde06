//! Thumbnail generator adapter
//!
//! Image resizing is an external capability; ingestion only needs the
//! contract. A failed thumbnail never fails ingestion, the record simply
//! persists without a thumbnail url.

use async_trait::async_trait;
use birdtag_common::{Error, Result};
use std::time::Duration;

/// Thumbnail generation contract (images only)
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    /// Produce resized, re-encoded thumbnail bytes for an image
    async fn thumbnail(&self, image: &[u8], extension: &str) -> Result<Vec<u8>>;
}

/// Thumbnailer client speaking HTTP to the resize service
pub struct HttpThumbnailer {
    client: reqwest::Client,
    url: String,
}

impl HttpThumbnailer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Thumbnailer client init failed: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Thumbnailer for HttpThumbnailer {
    async fn thumbnail(&self, image: &[u8], extension: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("ext", extension)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| Error::Dependency(format!("Thumbnailer call failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "Thumbnailer call failed: HTTP {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Dependency(format!("Thumbnailer response read failed: {}", e)))?;
        Ok(body.to_vec())
    }
}
