//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p tubely-api`. External tools and
//! the object store are replaced by the recording fakes in [`fakes`]; the
//! metadata store is the in-memory one, so no Docker or ffmpeg is needed.

pub mod fakes;
pub mod fixtures;

use axum_test::TestServer;
use fakes::{FakeAnalyzer, FakeRemuxer, RecordingStorage};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::auth::JwtService;
use tubely_api::setup::routes;
use tubely_api::{build_state, AppState, Collaborators};
use tubely_core::{BaseConfig, Config, IngestConfig, StorageBackend, ThumbnailBackend, VideoRecord};
use tubely_db::{MemoryVideoStore, VideoStore};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const TEST_JWT_ISSUER: &str = "tubely-access";
pub const TEST_BUCKET: &str = "tubely-test-videos";
pub const TEST_REGION: &str = "us-east-2";
pub const TEST_BASE_URL: &str = "http://localhost:8091";

/// Test application: server, fakes and owned scratch directories.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub videos: Arc<MemoryVideoStore>,
    pub analyzer: Arc<FakeAnalyzer>,
    pub remuxer: Arc<FakeRemuxer>,
    pub storage: Arc<RecordingStorage>,
    pub jwt: JwtService,
    pub staging_dir: TempDir,
    pub assets_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Bearer header value for `user_id`.
    pub fn bearer(&self, user_id: Uuid) -> String {
        let token = self
            .jwt
            .issue(user_id, chrono::Duration::hours(1))
            .expect("Failed to issue test token");
        format!("Bearer {}", token)
    }

    /// Insert a draft video owned by `owner` straight into the store.
    pub async fn create_video(&self, owner: Uuid) -> VideoRecord {
        self.videos
            .create(&VideoRecord::new(owner, "Boots".to_string(), None))
            .await
            .expect("Failed to create test video")
    }

    pub async fn video(&self, id: Uuid) -> VideoRecord {
        self.videos
            .get(id)
            .await
            .expect("Failed to load test video")
            .expect("Test video missing")
    }

    /// Files currently left in the staging directory.
    pub fn staging_entries(&self) -> usize {
        count_entries(self.staging_dir.path())
    }

    pub fn asset_entries(&self) -> usize {
        count_entries(self.assets_dir.path())
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .expect("Failed to read test directory")
        .count()
}

/// Configuration pointing at `staging` and `assets`, with the S3 backend
/// selected so object URLs use the AWS format.
pub fn test_config(staging: &Path, assets: &Path) -> IngestConfig {
    IngestConfig {
        base: BaseConfig {
            server_port: 8091,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 5,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_issuer: TEST_JWT_ISSUER.to_string(),
            environment: "test".to_string(),
        },
        database_url: None,
        storage_backend: StorageBackend::S3,
        s3_bucket: Some(TEST_BUCKET.to_string()),
        s3_region: Some(TEST_REGION.to_string()),
        s3_endpoint: None,
        s3_conditional_put: true,
        local_storage_path: None,
        local_storage_base_url: None,
        max_video_size_bytes: 10 * 1024 * 1024,
        video_allowed_content_types: vec!["video/mp4".to_string(), "video/quicktime".to_string()],
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        staging_dir: staging.to_path_buf(),
        aspect_ratio_tolerance_pct: 2,
        upload_timeout_secs: 60,
        thumbnail_backend: ThumbnailBackend::Disk,
        assets_root: assets.to_path_buf(),
        public_base_url: TEST_BASE_URL.to_string(),
        thumbnail_cache_capacity: 16,
        max_thumbnail_size_bytes: 1024 * 1024,
        thumbnail_allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup a test app after letting `customize` adjust the configuration.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut IngestConfig)) -> TestApp {
    let staging_dir = tempfile::tempdir().expect("Failed to create staging directory");
    let assets_dir = tempfile::tempdir().expect("Failed to create assets directory");

    let mut ingest_config = test_config(staging_dir.path(), assets_dir.path());
    customize(&mut ingest_config);
    let config = Config(Box::new(ingest_config));
    config.validate().expect("Test configuration is invalid");

    let videos = Arc::new(MemoryVideoStore::new());
    let analyzer = Arc::new(FakeAnalyzer::new(1920, 1080));
    let remuxer = Arc::new(FakeRemuxer::new());
    let storage = Arc::new(RecordingStorage::new(TEST_BUCKET, TEST_REGION));
    let thumbnails = tubely_storage::create_thumbnail_store(&config)
        .await
        .expect("Failed to create thumbnail store");

    let state = build_state(
        config.clone(),
        Collaborators {
            videos: videos.clone(),
            storage: storage.clone(),
            thumbnails,
            analyzer: analyzer.clone(),
            remuxer: remuxer.clone(),
            credentials: Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER)),
        },
    )
    .expect("Failed to build app state");

    let router = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        videos,
        analyzer,
        remuxer,
        storage,
        jwt: JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER),
        staging_dir,
        assets_dir,
    }
}
