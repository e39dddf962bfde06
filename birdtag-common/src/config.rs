//! Configuration loading for BirdTag services
//!
//! Resolution order per setting: environment variable, then TOML config
//! file, then compiled default. Both services share one config file so the
//! store path and external endpoints stay consistent.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shared service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirdtagConfig {
    /// Path to the shared SQLite media record store
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Blob store HTTP endpoint (path-style object addressing)
    #[serde(default = "default_blob_endpoint")]
    pub blob_endpoint: String,

    /// Species detection service endpoint
    #[serde(default = "default_detector_url")]
    pub detector_url: String,

    /// Thumbnail generation service endpoint
    #[serde(default = "default_thumbnailer_url")]
    pub thumbnailer_url: String,

    /// Minimum detection confidence kept during aggregation
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Timeout applied to detector, thumbnailer, and blob calls (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Listen port for birdtag-ingest
    #[serde(default = "default_ingest_port")]
    pub ingest_port: u16,

    /// Listen port for birdtag-query
    #[serde(default = "default_query_port")]
    pub query_port: u16,
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("birdtag").join("birdtag.db"))
        .unwrap_or_else(|| PathBuf::from("./birdtag_data/birdtag.db"))
}

fn default_blob_endpoint() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_detector_url() -> String {
    "http://127.0.0.1:5750/api/detect".to_string()
}

fn default_thumbnailer_url() -> String {
    "http://127.0.0.1:5751/api/thumbnail".to_string()
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_ingest_port() -> u16 {
    5741
}

fn default_query_port() -> u16 {
    5742
}

impl Default for BirdtagConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            blob_endpoint: default_blob_endpoint(),
            detector_url: default_detector_url(),
            thumbnailer_url: default_thumbnailer_url(),
            confidence_threshold: default_confidence_threshold(),
            request_timeout_secs: default_request_timeout_secs(),
            ingest_port: default_ingest_port(),
            query_port: default_query_port(),
        }
    }
}

impl BirdtagConfig {
    /// Load configuration
    ///
    /// `cli_path` (from --config) wins over $BIRDTAG_CONFIG, which wins
    /// over the platform config directory. A missing file is not an
    /// error; defaults apply. After the file, individual environment
    /// variables override single settings.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = cli_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("BIRDTAG_CONFIG").ok().map(PathBuf::from))
            .or_else(default_config_path);

        let mut config = match path {
            Some(ref p) if p.exists() => {
                let content = std::fs::read_to_string(p)
                    .map_err(|e| Error::Config(format!("Read config {} failed: {}", p.display(), e)))?;
                let parsed: BirdtagConfig = toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Parse config {} failed: {}", p.display(), e)))?;
                tracing::info!("Configuration loaded from {}", p.display());
                parsed
            }
            _ => {
                tracing::info!("No config file found, using defaults");
                BirdtagConfig::default()
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("BIRDTAG_DATABASE_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("BIRDTAG_BLOB_ENDPOINT") {
            self.blob_endpoint = v;
        }
        if let Ok(v) = std::env::var("BIRDTAG_DETECTOR_URL") {
            self.detector_url = v;
        }
        if let Ok(v) = std::env::var("BIRDTAG_THUMBNAILER_URL") {
            self.thumbnailer_url = v;
        }
        if let Ok(v) = std::env::var("BIRDTAG_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = v
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BIRDTAG_CONFIDENCE_THRESHOLD: {}", v)))?;
        }
        if let Ok(v) = std::env::var("BIRDTAG_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BIRDTAG_REQUEST_TIMEOUT_SECS: {}", v)))?;
        }
        if let Ok(v) = std::env::var("BIRDTAG_INGEST_PORT") {
            self.ingest_port = v
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BIRDTAG_INGEST_PORT: {}", v)))?;
        }
        if let Ok(v) = std::env::var("BIRDTAG_QUERY_PORT") {
            self.query_port = v
                .parse()
                .map_err(|_| Error::Config(format!("Invalid BIRDTAG_QUERY_PORT: {}", v)))?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("birdtag").join("birdtag.toml"))
}
