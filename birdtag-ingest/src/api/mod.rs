//! HTTP API handlers for birdtag-ingest

mod health;
mod ingest;

pub use health::health;
pub use ingest::ingest_batch;
