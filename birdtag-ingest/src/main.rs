//! birdtag-ingest - Media Ingestion Microservice
//!
//! Turns file-arrival notifications into durable media records: downloads
//! the blob, runs the species detector, aggregates detections into a tag
//! histogram, generates thumbnails for images, and upserts the record.

use anyhow::Result;
use birdtag_common::blob::HttpBlobStore;
use birdtag_common::config::BirdtagConfig;
use birdtag_ingest::detector::HttpDetector;
use birdtag_ingest::thumbnail::HttpThumbnailer;
use birdtag_ingest::{build_router, AppState, IngestPipeline};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "birdtag-ingest", about = "BirdTag media ingestion service")]
struct Args {
    /// Path to birdtag.toml (overrides $BIRDTAG_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port (overrides configuration)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting BirdTag Ingest (birdtag-ingest) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let config = BirdtagConfig::load(args.config.as_deref())?;
    let port = args.port.unwrap_or(config.ingest_port);

    info!("Database path: {}", config.database_path.display());
    let pool = birdtag_common::db::init_pool(&config.database_path).await?;
    info!("Database connection established");

    let timeout = config.request_timeout();
    let detector = Arc::new(HttpDetector::new(&config.detector_url, timeout)?);
    let thumbnailer = Arc::new(HttpThumbnailer::new(&config.thumbnailer_url, timeout)?);
    let blobs = Arc::new(HttpBlobStore::new(&config.blob_endpoint, timeout)?);

    let pipeline = Arc::new(IngestPipeline::new(
        pool,
        detector,
        blobs,
        thumbnailer,
        config.confidence_threshold,
        timeout,
    ));

    let state = AppState::new(pipeline);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("birdtag-ingest listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
