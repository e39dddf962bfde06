//! birdtag-query - Query/Mutation/Deletion Microservice
//!
//! Serves the read and write API over the shared media record store:
//! threshold and existence search, reverse thumbnail lookup, bulk tag
//! mutation, and coordinated blob + record deletion.

use anyhow::Result;
use birdtag_common::blob::HttpBlobStore;
use birdtag_common::config::BirdtagConfig;
use birdtag_query::{build_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "birdtag-query", about = "BirdTag query and mutation service")]
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
        "Starting BirdTag Query (birdtag-query) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let config = BirdtagConfig::load(args.config.as_deref())?;
    let port = args.port.unwrap_or(config.query_port);

    info!("Database path: {}", config.database_path.display());
    let pool = birdtag_common::db::init_pool(&config.database_path).await?;
    info!("Database connection established");

    let blobs = Arc::new(HttpBlobStore::new(
        &config.blob_endpoint,
        config.request_timeout(),
    )?);

    let state = AppState::new(pool, blobs);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("birdtag-query listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
