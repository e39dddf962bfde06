//! Media record store backed by shared SQLite database

pub mod records;

pub use records::{FileType, MediaRecord};

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the shared birdtag.db, creating the file and parent
/// directory when missing.
pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the media_records table if it does not exist
///
/// `tag_counts` is stored as a JSON object (label → positive count).
/// `version` backs the compare-and-swap tag mutation path.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_records (
            url TEXT PRIMARY KEY,
            file_type TEXT NOT NULL,
            tag_counts TEXT NOT NULL DEFAULT '{}',
            thumbnail_url TEXT,
            version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (media_records)");

    Ok(())
}
