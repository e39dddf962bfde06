//! Blob store client
//!
//! The services only need the blob store's contract: fetch, store, and
//! delete objects addressed by (bucket, key), plus the mapping between
//! (bucket, key) and the public object URL used as the record primary key.

use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Object storage contract used by ingestion and deletion
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the full object body
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store an object, replacing any existing body
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Delete an object; deleting a missing object is a failure
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Public URL for an object, used as the canonical record locator
    fn object_url(&self, bucket: &str, key: &str) -> String;
}

/// Split a public object URL back into (bucket, key)
///
/// Accepts both virtual-hosted URLs (`https://bucket.s3.region.host/key`)
/// and path-style URLs (`https://host/bucket/key`).
pub fn parse_object_url(raw: &str) -> Result<(String, String)> {
    let parsed = Url::parse(raw).map_err(|e| Error::InvalidInput(format!("Invalid URL {}: {}", raw, e)))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| Error::InvalidInput(format!("URL has no host: {}", raw)))?;

    let path = parsed.path().trim_start_matches('/');
    if path.is_empty() {
        return Err(Error::InvalidInput(format!("URL has no object key: {}", raw)));
    }

    if let Some((bucket, _)) = host.split_once(".s3.") {
        // Virtual-hosted style: bucket.s3.region.host/key
        return Ok((bucket.to_string(), path.to_string()));
    }

    // Path style: host/bucket/key
    match path.split_once('/') {
        Some((bucket, key)) if !key.is_empty() => Ok((bucket.to_string(), key.to_string())),
        _ => Err(Error::InvalidInput(format!("URL has no object key: {}", raw))),
    }
}

/// Blob store speaking plain HTTP against a path-style endpoint
pub struct HttpBlobStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBlobStore {
    /// Create a client against `endpoint` with every call bounded by `timeout`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Blob store client init failed: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let url = self.object_url(bucket, key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Dependency(format!("Blob get {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "Blob get {} failed: HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Dependency(format!("Blob get {} failed: {}", url, e)))?;
        Ok(body.to_vec())
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let url = self.object_url(bucket, key);
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Dependency(format!("Blob put {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "Blob put {} failed: HTTP {}",
                url,
                response.status()
            )));
        }
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let url = self.object_url(bucket, key);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::Dependency(format!("Blob delete {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "Blob delete {} failed: HTTP {}",
                url,
                response.status()
            )));
        }
        Ok(())
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key)
    }
}
