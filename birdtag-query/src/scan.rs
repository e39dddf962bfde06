//! Paged linear scan over the record collection
//!
//! The store offers no compound index on tag keys, so both search
//! operations walk the whole collection page by page, evaluating the
//! predicate in process, and return the full logical result.

use birdtag_common::db::records::scan_page;
use birdtag_common::db::MediaRecord;
use birdtag_common::Result;
use sqlx::SqlitePool;

pub const SCAN_PAGE_SIZE: i64 = 100;

/// Collect every record satisfying `predicate`, scanning until exhausted
pub async fn scan_matching<F>(pool: &SqlitePool, predicate: F) -> Result<Vec<MediaRecord>>
where
    F: Fn(&MediaRecord) -> bool,
{
    let mut matches = Vec::new();
    let mut offset = 0i64;

    loop {
        let page = scan_page(pool, SCAN_PAGE_SIZE, offset).await?;
        let fetched = page.len() as i64;

        matches.extend(page.into_iter().filter(|record| predicate(record)));

        if fetched < SCAN_PAGE_SIZE {
            break;
        }
        offset += fetched;
    }

    Ok(matches)
}
