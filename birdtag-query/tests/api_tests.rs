//! Integration tests for birdtag-query API endpoints
//!
//! Covers threshold search AND semantics, existence search, reverse
//! thumbnail lookup, bulk tag mutation (with optimistic-concurrency
//! writes), and coordinated deletion, all against an in-memory store and
//! an in-process blob store fake.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use birdtag_common::blob::BlobStore;
use birdtag_common::db::records::{get_by_url, upsert_record};
use birdtag_common::db::{self, FileType, MediaRecord};
use birdtag_common::tags::{aggregate, TagCounts};
use birdtag_common::{Error, Result};
use birdtag_query::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

/// Blob store fake tracking which objects exist
struct FakeBlobStore {
    objects: Mutex<HashSet<(String, String)>>,
}

impl FakeBlobStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(HashSet::new()),
        })
    }

    fn insert(&self, bucket: &str, key: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()));
    }

    fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains(&(bucket.to_string(), key.to_string()))
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        if self.contains(bucket, key) {
            Ok(Vec::new())
        } else {
            Err(Error::Dependency(format!("Blob get {}/{} failed: HTTP 404", bucket, key)))
        }
    }

    async fn put(&self, bucket: &str, key: &str, _body: Vec<u8>, _content_type: &str) -> Result<()> {
        self.insert(bucket, key);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        if self
            .objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()))
        {
            Ok(())
        } else {
            Err(Error::Dependency(format!("Blob delete {}/{} failed: HTTP 404", bucket, key)))
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("http://blobs.test/{}/{}", bucket, key)
    }
}

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    db::init_tables(&pool).await.unwrap();
    pool
}

fn setup_app(pool: SqlitePool, blobs: Arc<FakeBlobStore>) -> axum::Router {
    build_router(AppState::new(pool, blobs))
}

async fn seed(pool: &SqlitePool, url: &str, file_type: FileType, labels: &[&str], thumbnail: Option<&str>) {
    let mut record = MediaRecord::new(url.to_string(), file_type, aggregate(labels.iter().copied()));
    record.thumbnail_url = thumbnail.map(|s| s.to_string());
    upsert_record(pool, &record).await.unwrap();
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

const IMAGE_URL: &str = "http://blobs.test/media/images/crows.jpg";
const THUMB_URL: &str = "http://blobs.test/media/thumbnails/crows.jpg";
const VIDEO_URL: &str = "http://blobs.test/media/videos/crow.mp4";

/// Image with {"crow": 2, "pigeon": 1} plus a video with {"crow": 1}
async fn seed_standard(pool: &SqlitePool) {
    seed(pool, IMAGE_URL, FileType::Image, &["crow", "pigeon", "crow"], Some(THUMB_URL)).await;
    seed(pool, VIDEO_URL, FileType::Video, &["crow"], None).await;
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(setup_pool().await, FakeBlobStore::new());

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "birdtag-query");
}

// =============================================================================
// Threshold search
// =============================================================================

#[tokio::test]
async fn test_threshold_search_and_semantics() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;
    let app = setup_app(pool, FakeBlobStore::new());

    // crow >= 2 excludes the video (crow count 1)
    let uri = format!("/api/search?tags={}", urlencode(r#"{"crow":2}"#));
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["url"], IMAGE_URL);
    assert_eq!(images[0]["tagCounts"]["crow"], 2);
    assert_eq!(images[0]["thumbnailUrl"], THUMB_URL);
    assert!(body["videos"].as_array().unwrap().is_empty());
    assert!(body["audios"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_threshold_search_multiple_labels_all_must_hold() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;
    let app = setup_app(pool, FakeBlobStore::new());

    // crow >= 1 AND pigeon >= 1: only the image has pigeon
    let uri = format!("/api/search?tags={}", urlencode(r#"{"crow":1,"pigeon":1}"#));
    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert!(body["videos"].as_array().unwrap().is_empty());

    // crow >= 1 alone matches both, partitioned by file type
    let uri = format!("/api/search?tags={}", urlencode(r#"{"crow":1}"#));
    let response = app.oneshot(get(&uri)).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert_eq!(body["videos"].as_array().unwrap().len(), 1);
    // Non-image entries carry no thumbnail url
    assert!(body["videos"][0].get("thumbnailUrl").is_none());
}

#[tokio::test]
async fn test_threshold_search_validation_errors() {
    let pool = setup_pool().await;
    let app = setup_app(pool, FakeBlobStore::new());

    let response = app.clone().oneshot(get("/api/search")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Missing tags parameter");

    let uri = format!("/api/search?tags={}", urlencode("{not json"));
    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Invalid tags JSON format");

    let uri = format!("/api/search?tags={}", urlencode(r#"["crow"]"#));
    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Tags should be a JSON object");

    let uri = format!("/api/search?tags={}", urlencode(r#"{"crow":"two"}"#));
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Count for crow must be a number");
}

#[tokio::test]
async fn test_file_based_search_matches_query_variant() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;
    let app = setup_app(pool, FakeBlobStore::new());

    // crow >= 2 excludes the video, same as the query-param endpoint
    let response = app
        .clone()
        .oneshot(post_json("/api/file-based-search", r#"{"tags": {"crow": 2}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["url"], IMAGE_URL);
    assert_eq!(images[0]["thumbnailUrl"], THUMB_URL);
    assert!(body["videos"].as_array().unwrap().is_empty());

    // crow >= 1 matches both records
    let response = app
        .oneshot(post_json("/api/file-based-search", r#"{"tags": {"crow": 1}}"#))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert_eq!(body["videos"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_based_search_validation_errors() {
    let app = setup_app(setup_pool().await, FakeBlobStore::new());

    let response = app
        .clone()
        .oneshot(post_json("/api/file-based-search", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("invalid JSON"));

    let response = app
        .clone()
        .oneshot(post_json("/api/file-based-search", r#"{"species": "crow"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Missing tags field in request");

    let response = app
        .clone()
        .oneshot(post_json("/api/file-based-search", r#"{"tags": ["crow"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "tags must be a dictionary");

    let response = app
        .oneshot(post_json("/api/file-based-search", r#"{"tags": {"crow": "two"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Invalid count for crow");
}

// =============================================================================
// Existence search
// =============================================================================

#[tokio::test]
async fn test_species_search_matches_any_count() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;
    let app = setup_app(pool, FakeBlobStore::new());

    let response = app
        .clone()
        .oneshot(get("/api/search-by-species?species=crow"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert_eq!(body["videos"].as_array().unwrap().len(), 1);

    // pigeon appears only in the image record
    let response = app
        .clone()
        .oneshot(get("/api/search-by-species?species=pigeon"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert!(body["videos"].as_array().unwrap().is_empty());

    // unknown species matches nothing
    let response = app
        .oneshot(get("/api/search-by-species?species=owl"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert!(body["images"].as_array().unwrap().is_empty());
    assert!(body["videos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_species_search_requires_parameter() {
    let app = setup_app(setup_pool().await, FakeBlobStore::new());

    let response = app.oneshot(get("/api/search-by-species")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Species parameter is required");
}

// =============================================================================
// Reverse thumbnail lookup
// =============================================================================

#[tokio::test]
async fn test_thumbnail_lookup_resolves_owner() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;
    let app = setup_app(pool, FakeBlobStore::new());

    let uri = format!("/api/search-by-thumbnail?thumbnailUrl={}", urlencode(THUMB_URL));
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["url"], IMAGE_URL);
    assert_eq!(body["fileType"], "image");
    assert_eq!(body["tagCounts"]["crow"], 2);
}

#[tokio::test]
async fn test_thumbnail_lookup_unknown_is_404() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;
    let app = setup_app(pool, FakeBlobStore::new());

    let uri = format!(
        "/api/search-by-thumbnail?thumbnailUrl={}",
        urlencode("http://blobs.test/media/thumbnails/nope.jpg")
    );
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No matching file found");
}

// =============================================================================
// Bulk tag mutation
// =============================================================================

#[tokio::test]
async fn test_mutation_add_tags() {
    let pool = setup_pool().await;
    seed(&pool, IMAGE_URL, FileType::Image, &["crow", "crow"], Some(THUMB_URL)).await;
    let app = setup_app(pool.clone(), FakeBlobStore::new());

    let body = format!(r#"{{"urls": ["{}"], "operation": 1, "tags": ["owl,3"]}}"#, IMAGE_URL);
    let response = app.oneshot(post_json("/api/tags", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["updatedCount"], 1);
    assert_eq!(body["updatedUrls"][0], IMAGE_URL);
    assert!(body["failed"].as_array().unwrap().is_empty());

    let record = get_by_url(&pool, IMAGE_URL).await.unwrap().unwrap();
    assert_eq!(record.tag_counts.get("crow"), 2);
    assert_eq!(record.tag_counts.get("owl"), 3);
}

#[tokio::test]
async fn test_mutation_remove_clamps_and_drops_key() {
    let pool = setup_pool().await;
    seed(&pool, IMAGE_URL, FileType::Image, &["crow", "crow"], Some(THUMB_URL)).await;
    let app = setup_app(pool.clone(), FakeBlobStore::new());

    let body = format!(r#"{{"urls": ["{}"], "operation": 0, "tags": ["crow,5"]}}"#, IMAGE_URL);
    let response = app.oneshot(post_json("/api/tags", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = get_by_url(&pool, IMAGE_URL).await.unwrap().unwrap();
    assert!(record.tag_counts.is_empty());
}

#[tokio::test]
async fn test_mutation_resolves_thumbnail_url() {
    let pool = setup_pool().await;
    seed(&pool, IMAGE_URL, FileType::Image, &["crow"], Some(THUMB_URL)).await;
    let app = setup_app(pool.clone(), FakeBlobStore::new());

    let body = format!(r#"{{"urls": ["{}"], "operation": 1, "tags": ["owl,1"]}}"#, THUMB_URL);
    let response = app.oneshot(post_json("/api/tags", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = get_by_url(&pool, IMAGE_URL).await.unwrap().unwrap();
    assert_eq!(record.tag_counts.get("owl"), 1);
}

#[tokio::test]
async fn test_mutation_skips_malformed_entries() {
    let pool = setup_pool().await;
    seed(&pool, IMAGE_URL, FileType::Image, &["crow"], None).await;
    let app = setup_app(pool.clone(), FakeBlobStore::new());

    // No comma, negative delta, unparseable delta, empty label: all skipped.
    // " Owl ,2" is normalized to "owl".
    let body = format!(
        r#"{{"urls": ["{}"], "operation": 1, "tags": ["bare", "owl,-2", "owl,x", " ,3", " Owl ,2"]}}"#,
        IMAGE_URL
    );
    let response = app.oneshot(post_json("/api/tags", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = get_by_url(&pool, IMAGE_URL).await.unwrap().unwrap();
    assert_eq!(record.tag_counts.get("crow"), 1);
    assert_eq!(record.tag_counts.get("owl"), 2);
    assert_eq!(record.tag_counts.len(), 2);
}

#[tokio::test]
async fn test_mutation_unknown_url_is_per_url_failure() {
    let pool = setup_pool().await;
    seed(&pool, IMAGE_URL, FileType::Image, &["crow"], None).await;
    let app = setup_app(pool.clone(), FakeBlobStore::new());

    let body = format!(
        r#"{{"urls": ["http://blobs.test/media/images/nope.jpg", "{}"], "operation": 1, "tags": ["owl,1"]}}"#,
        IMAGE_URL
    );
    let response = app.oneshot(post_json("/api/tags", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["updatedCount"], 1);
    let failed = body["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["reason"], "Not found in DB");
}

#[tokio::test]
async fn test_mutation_validation_errors() {
    let app = setup_app(setup_pool().await, FakeBlobStore::new());

    let response = app
        .clone()
        .oneshot(post_json("/api/tags", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("invalid JSON"));

    let response = app
        .clone()
        .oneshot(post_json("/api/tags", r#"{"urls": "x", "operation": 1, "tags": []}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "urls must be a list");

    let response = app
        .clone()
        .oneshot(post_json("/api/tags", r#"{"urls": [], "operation": 2, "tags": []}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "operation must be 0 or 1");

    let response = app
        .oneshot(post_json("/api/tags", r#"{"urls": [], "operation": 1, "tags": "x"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "tags must be a list");
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_unknown_url_reports_failure() {
    let app = setup_app(setup_pool().await, FakeBlobStore::new());

    let response = app
        .oneshot(post_json(
            "/api/delete-files",
            r#"{"urls": ["http://blobs.test/media/images/nope.jpg"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["deleted"].as_array().unwrap().is_empty());
    let failed = body["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["url"], "http://blobs.test/media/images/nope.jpg");
    assert_eq!(failed[0]["reason"], "Not found in DB");
}

#[tokio::test]
async fn test_delete_removes_blobs_and_record() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;

    let blobs = FakeBlobStore::new();
    blobs.insert("media", "images/crows.jpg");
    blobs.insert("media", "thumbnails/crows.jpg");

    let app = setup_app(pool.clone(), blobs.clone());

    let body = format!(r#"{{"urls": ["{}"]}}"#, IMAGE_URL);
    let response = app.clone().oneshot(post_json("/api/delete-files", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["failed"].as_array().unwrap().is_empty());
    let deleted = body["deleted"].as_array().unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0]["url"], IMAGE_URL);
    let deleted_blobs = deleted[0]["deletedBlobs"].as_array().unwrap();
    assert_eq!(deleted_blobs.len(), 2);

    assert!(!blobs.contains("media", "images/crows.jpg"));
    assert!(!blobs.contains("media", "thumbnails/crows.jpg"));
    assert!(get_by_url(&pool, IMAGE_URL).await.unwrap().is_none());

    // Neither search surface ever returns the deleted record again
    let uri = format!("/api/search?tags={}", urlencode(r#"{"crow":1}"#));
    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert!(body["images"].as_array().unwrap().is_empty());

    let response = app
        .oneshot(get("/api/search-by-species?species=pigeon"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert!(body["images"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_thumbnail_failure_is_best_effort() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;

    // Primary blob exists, thumbnail blob is already gone
    let blobs = FakeBlobStore::new();
    blobs.insert("media", "images/crows.jpg");

    let app = setup_app(pool.clone(), blobs);

    let body = format!(r#"{{"urls": ["{}"]}}"#, IMAGE_URL);
    let response = app.oneshot(post_json("/api/delete-files", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    // Thumbnail failure is recorded, record deletion still happens
    let failed = body["failed"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["url"], THUMB_URL);

    let deleted = body["deleted"].as_array().unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0]["deletedBlobs"].as_array().unwrap().len(), 1);

    assert!(get_by_url(&pool, IMAGE_URL).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_resolves_thumbnail_url() {
    let pool = setup_pool().await;
    seed_standard(&pool).await;

    let blobs = FakeBlobStore::new();
    blobs.insert("media", "images/crows.jpg");
    blobs.insert("media", "thumbnails/crows.jpg");

    let app = setup_app(pool.clone(), blobs);

    let body = format!(r#"{{"urls": ["{}"]}}"#, THUMB_URL);
    let response = app.oneshot(post_json("/api/delete-files", &body)).await.unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["deleted"].as_array().unwrap().len(), 1);
    assert!(get_by_url(&pool, IMAGE_URL).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_requires_non_empty_urls() {
    let app = setup_app(setup_pool().await, FakeBlobStore::new());

    let response = app
        .clone()
        .oneshot(post_json("/api/delete-files", r#"{"urls": []}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "urls must be a non-empty list");

    let response = app
        .oneshot(post_json("/api/delete-files", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Invalid JSON");
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_unknown_route_gets_structured_error() {
    let app = setup_app(setup_pool().await, FakeBlobStore::new());

    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Invalid request");
}

/// Minimal percent-encoding for query parameter values in tests
fn urlencode(raw: &str) -> String {
    let mut out = String::new();
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
