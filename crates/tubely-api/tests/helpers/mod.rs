//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p tubely-api --test upload_test`.
//! Uses the in-memory repository, local storage in temp dirs, and scripted
//! media tools in place of ffprobe/ffmpeg.

#![allow(dead_code)]

pub mod tools;

use axum_test::TestServer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use tubely_api::auth::make_jwt;
use tubely_api::setup::{routes, services};
use tubely_core::{BaseConfig, Config, IngestConfig, RepositoryBackend, StorageBackend, Video};
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_storage::{LocalStorage, Storage};

use tools::{ScriptedInspector, ScriptedRemuxer};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const STORAGE_BASE_URL: &str = "http://storage.test/videos";
pub const ASSETS_BASE_URL: &str = "http://localhost:8091";

#[derive(Clone, Copy)]
pub struct TestOptions {
    pub aspect_ratio: Option<&'static str>,
    pub remux_fails: bool,
    pub environment: &'static str,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: Some("16:9"),
            remux_fails: false,
            environment: "development",
        }
    }
}

/// Test application: server, seeded record and owned directories.
pub struct TestApp {
    pub server: TestServer,
    pub videos: Arc<InMemoryVideoRepository>,
    pub owner: Uuid,
    pub video: Video,
    pub token: String,
    pub temp_dir: TempDir,
    pub storage_dir: TempDir,
    pub assets_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        make_jwt(user_id, TEST_JWT_SECRET, chrono::Duration::hours(1)).unwrap()
    }

    pub async fn stored_video(&self) -> Video {
        self.videos.get_video(self.video.id).await.unwrap().unwrap()
    }
}

fn test_config(options: &TestOptions, temp_dir: &Path, assets_dir: &Path) -> Config {
    Config(Box::new(IngestConfig {
        base: BaseConfig {
            server_port: 8091,
            cors_origins: vec!["http://localhost:8091".to_string()],
            jwt_secret: TEST_JWT_SECRET.to_string(),
            environment: options.environment.to_string(),
            db_max_connections: 1,
            db_timeout_seconds: 5,
        },
        video_repository: RepositoryBackend::Memory,
        database_url: None,
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: None,
        local_storage_base_url: Some(STORAGE_BASE_URL.to_string()),
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        probe_timeout_secs: 5,
        remux_timeout_secs: 5,
        upload_temp_dir: temp_dir.to_path_buf(),
        assets_root: PathBuf::from(assets_dir),
        assets_base_url: ASSETS_BASE_URL.to_string(),
    }))
}

/// Setup test app with one video record owned by a fresh user.
pub async fn setup_test_app(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage_dir = tempfile::tempdir().unwrap();
    let assets_dir = tempfile::tempdir().unwrap();

    let config = test_config(&options, temp_dir.path(), assets_dir.path());

    let videos = Arc::new(InMemoryVideoRepository::new());
    let owner = Uuid::new_v4();
    let video = videos
        .create_video(&Video::new(owner, "Boots", "A video about boots"))
        .await
        .unwrap();

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(storage_dir.path(), STORAGE_BASE_URL.to_string())
            .await
            .unwrap(),
    );
    let assets: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(assets_dir.path(), format!("{}/assets", ASSETS_BASE_URL))
            .await
            .unwrap(),
    );

    let state = services::build_state(
        &config,
        videos.clone(),
        storage,
        assets,
        Arc::new(ScriptedInspector::new(options.aspect_ratio)),
        Arc::new(ScriptedRemuxer::new(options.remux_fails)),
    )
    .await
    .unwrap();

    let router = routes::setup_routes(&config, state).unwrap();
    let server = TestServer::new(router).unwrap();
    let token = make_jwt(owner, TEST_JWT_SECRET, chrono::Duration::hours(1)).unwrap();

    TestApp {
        server,
        videos,
        owner,
        video,
        token,
        temp_dir,
        storage_dir,
        assets_dir,
    }
}

/// Every regular file below `dir`.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}
