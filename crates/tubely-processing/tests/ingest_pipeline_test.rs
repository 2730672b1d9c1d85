//! End-to-end pipeline tests with scripted media tools.
//!
//! Run with: `cargo test -p tubely-processing --test ingest_pipeline_test`

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use futures::{stream, Stream};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use tubely_core::{AppError, ProbeResult, Video};
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_processing::{
    processed_output_path, MediaInspector, PipelineStage, Remuxer, StagingConfig,
    ThumbnailService, UploadStager, VideoIngestPipeline,
};
use tubely_storage::{LocalStorage, Storage, StorageBackend, StorageError, StorageResult};

const STORAGE_BASE_URL: &str = "https://tubely-videos.example/media";

struct ScriptedInspector {
    aspect_ratio: Option<&'static str>,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl MediaInspector for ScriptedInspector {
    async fn probe(&self, path: &Path) -> Result<ProbeResult, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe must see the staged file");
        if self.fail {
            return Err(AppError::Probe("ffprobe exited with status 1".to_string()));
        }
        Ok(ProbeResult::new(
            1920,
            1080,
            self.aspect_ratio.map(str::to_string),
        ))
    }
}

struct ScriptedRemuxer {
    fail: bool,
    stall: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl Remuxer for ScriptedRemuxer {
    async fn fast_start(&self, input: &Path) -> Result<PathBuf, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = processed_output_path(input);
        if self.stall {
            // Partial output on disk while the tool is still running.
            tokio::fs::write(&output, b"partial").await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        if self.fail {
            // Leave a partial output behind, as a crashed ffmpeg would.
            tokio::fs::write(&output, b"partial").await.unwrap();
            return Err(AppError::Remux("ffmpeg exited with status 1".to_string()));
        }
        let mut data = b"faststart:".to_vec();
        data.extend(tokio::fs::read(input).await.unwrap());
        tokio::fs::write(&output, data).await.unwrap();
        Ok(output)
    }
}

/// Object store that refuses every write.
struct RefusingStorage;

#[async_trait]
impl Storage for RefusingStorage {
    async fn upload_bytes(
        &self,
        _storage_key: &str,
        _data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        Err(StorageError::UploadFailed("quota exceeded".to_string()))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", STORAGE_BASE_URL, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Repository whose updates always fail.
struct BrokenUpdates {
    inner: InMemoryVideoRepository,
}

#[async_trait]
impl VideoRepository for BrokenUpdates {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        self.inner.get_video(id).await
    }

    async fn create_video(&self, video: &Video) -> Result<Video, AppError> {
        self.inner.create_video(video).await
    }

    async fn update_video_url(&self, _id: Uuid, _video_url: &str) -> Result<Video, AppError> {
        Err(AppError::Persistence("connection reset".to_string()))
    }

    async fn update_thumbnail_url(&self, _id: Uuid, _url: &str) -> Result<Video, AppError> {
        Err(AppError::Persistence("connection reset".to_string()))
    }
}

struct Harness {
    pipeline: VideoIngestPipeline,
    videos: Arc<dyn VideoRepository>,
    inspector: Arc<ScriptedInspector>,
    remuxer: Arc<ScriptedRemuxer>,
    owner: Uuid,
    video: Video,
    temp_dir: TempDir,
    storage_dir: TempDir,
}

struct HarnessOptions {
    aspect_ratio: Option<&'static str>,
    probe_fails: bool,
    remux_fails: bool,
    remux_stalls: bool,
    publish_fails: bool,
    broken_updates: bool,
    max_bytes: Option<u64>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: Some("16:9"),
            probe_fails: false,
            remux_fails: false,
            remux_stalls: false,
            publish_fails: false,
            broken_updates: false,
            max_bytes: None,
        }
    }
}

async fn harness(options: HarnessOptions) -> Harness {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage_dir = tempfile::tempdir().unwrap();

    let storage: Arc<dyn Storage> = if options.publish_fails {
        Arc::new(RefusingStorage)
    } else {
        Arc::new(
            LocalStorage::new(storage_dir.path(), STORAGE_BASE_URL.to_string())
                .await
                .unwrap(),
        )
    };

    let videos: Arc<dyn VideoRepository> = if options.broken_updates {
        Arc::new(BrokenUpdates {
            inner: InMemoryVideoRepository::new(),
        })
    } else {
        Arc::new(InMemoryVideoRepository::new())
    };

    let owner = Uuid::new_v4();
    let video = videos
        .create_video(&Video::new(owner, "Boots", "A video about boots"))
        .await
        .unwrap();

    let inspector = Arc::new(ScriptedInspector {
        aspect_ratio: options.aspect_ratio,
        fail: options.probe_fails,
        calls: AtomicUsize::new(0),
    });
    let remuxer = Arc::new(ScriptedRemuxer {
        fail: options.remux_fails,
        stall: options.remux_stalls,
        calls: AtomicUsize::new(0),
    });

    let mut staging = StagingConfig::video(temp_dir.path());
    if let Some(max_bytes) = options.max_bytes {
        staging = staging.with_max_bytes(max_bytes);
    }

    let pipeline = VideoIngestPipeline::new(
        UploadStager::new(staging),
        inspector.clone(),
        remuxer.clone(),
        storage,
        videos.clone(),
    );

    Harness {
        pipeline,
        videos,
        inspector,
        remuxer,
        owner,
        video,
        temp_dir,
        storage_dir,
    }
}

fn body(data: &[u8]) -> impl Stream<Item = Result<Bytes, io::Error>> + Send {
    let chunks: Vec<Result<Bytes, io::Error>> = data
        .chunks(4)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    stream::iter(chunks)
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
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

fn assert_key_shape(key: &str, prefix: &str) {
    let (key_prefix, file) = key.split_once('/').expect("key has a prefix");
    assert_eq!(key_prefix, prefix);
    let (token, ext) = file.rsplit_once('.').expect("key has an extension");
    assert_eq!(ext, "mp4");
    assert_eq!(URL_SAFE_NO_PAD.decode(token).unwrap().len(), 32);
}

#[tokio::test]
async fn test_successful_upload_publishes_and_records() {
    let h = harness(HarnessOptions::default()).await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let outcome = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), body(b"ftyp....mdat....moov"))
        .await
        .unwrap();

    assert_key_shape(&outcome.key, "landscape");
    assert_eq!(outcome.url, format!("{}/{}", STORAGE_BASE_URL, outcome.key));
    assert_eq!(outcome.size_bytes, 20);
    assert_eq!(outcome.video.video_url.as_deref(), Some(outcome.url.as_str()));

    let stored = h.videos.get_video(h.video.id).await.unwrap().unwrap();
    assert_eq!(stored.video_url.as_deref(), Some(outcome.url.as_str()));

    let published = std::fs::read(h.storage_dir.path().join(&outcome.key)).unwrap();
    assert_eq!(published, b"faststart:ftyp....mdat....moov");

    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_orientation_selects_key_prefix() {
    for (aspect_ratio, prefix) in [
        (Some("16:9"), "landscape"),
        (Some("9:16"), "portrait"),
        (Some("4:3"), "other"),
        (None, "other"),
    ] {
        let h = harness(HarnessOptions {
            aspect_ratio,
            ..Default::default()
        })
        .await;

        let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
        let outcome = h
            .pipeline
            .ingest(authorized, Some("video/mp4"), body(b"video bytes"))
            .await
            .unwrap();

        assert_key_shape(&outcome.key, prefix);
    }
}

#[tokio::test]
async fn test_remux_failure_leaves_no_trace() {
    let h = harness(HarnessOptions {
        remux_fails: true,
        ..Default::default()
    })
    .await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let failure = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), body(b"video bytes"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Remuxed);
    assert!(matches!(failure.error, AppError::Remux(_)));

    assert!(files_under(h.storage_dir.path()).is_empty());
    assert!(files_under(h.temp_dir.path()).is_empty());
    let stored = h.videos.get_video(h.video.id).await.unwrap().unwrap();
    assert_eq!(stored.video_url, None);
    assert_eq!(stored.updated_at, h.video.updated_at);
}

#[tokio::test]
async fn test_probe_failure_stops_before_remux() {
    let h = harness(HarnessOptions {
        probe_fails: true,
        ..Default::default()
    })
    .await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let failure = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), body(b"video bytes"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Probed);
    assert!(matches!(failure.error, AppError::Probe(_)));
    assert_eq!(h.remuxer.calls.load(Ordering::SeqCst), 0);
    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_oversized_body_rejected_before_probe() {
    let h = harness(HarnessOptions {
        max_bytes: Some(16),
        ..Default::default()
    })
    .await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let failure = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), body(&[7u8; 64]))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Staged);
    assert!(matches!(failure.error, AppError::PayloadTooLarge(_)));
    assert_eq!(h.inspector.calls.load(Ordering::SeqCst), 0);
    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_non_owner_is_rejected_before_any_stage() {
    let h = harness(HarnessOptions::default()).await;

    let err = h
        .pipeline
        .authorize(h.video.id, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(h.inspector.calls.load(Ordering::SeqCst), 0);
    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let h = harness(HarnessOptions::default()).await;

    let err = h
        .pipeline
        .authorize(Uuid::new_v4(), h.owner)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_wrong_content_type_creates_no_temp_file() {
    let h = harness(HarnessOptions::default()).await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let failure = h
        .pipeline
        .ingest(authorized, Some("video/webm"), body(b"video bytes"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Staged);
    assert!(matches!(failure.error, AppError::InvalidInput(_)));
    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_truncated_upload_is_io_error() {
    let h = harness(HarnessOptions::default()).await;

    let truncated = stream::iter(vec![
        Ok(Bytes::from_static(b"ftyp")),
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "body ended early")),
    ]);

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let failure = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), truncated)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Staged);
    assert!(matches!(failure.error, AppError::Io(_)));
    assert_eq!(h.inspector.calls.load(Ordering::SeqCst), 0);
    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_publish_failure_leaves_record_untouched() {
    let h = harness(HarnessOptions {
        publish_fails: true,
        ..Default::default()
    })
    .await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let failure = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), body(b"video bytes"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Published);
    assert!(matches!(failure.error, AppError::Publish(_)));
    assert_eq!(h.remuxer.calls.load(Ordering::SeqCst), 1);

    let stored = h.videos.get_video(h.video.id).await.unwrap().unwrap();
    assert_eq!(stored.video_url, None);
    assert_eq!(stored.updated_at, h.video.updated_at);
    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_request_dropped_mid_remux_removes_partial_output() {
    let h = harness(HarnessOptions {
        remux_stalls: true,
        ..Default::default()
    })
    .await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let ingest = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), body(b"video bytes"));

    // Client disconnect: the request future is dropped while the tool runs.
    let result = tokio::time::timeout(Duration::from_millis(300), ingest).await;
    assert!(result.is_err());

    assert_eq!(h.remuxer.calls.load(Ordering::SeqCst), 1);
    assert!(files_under(h.temp_dir.path()).is_empty());
    assert!(files_under(h.storage_dir.path()).is_empty());
    let stored = h.videos.get_video(h.video.id).await.unwrap().unwrap();
    assert_eq!(stored.video_url, None);
}

#[tokio::test]
async fn test_persistence_failure_orphans_object() {
    let h = harness(HarnessOptions {
        broken_updates: true,
        ..Default::default()
    })
    .await;

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let failure = h
        .pipeline
        .ingest(authorized, Some("video/mp4"), body(b"video bytes"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Recorded);
    assert!(matches!(failure.error, AppError::Persistence(_)));
    assert_eq!(files_under(h.storage_dir.path()).len(), 1);
    assert!(files_under(h.temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_identical_uploads_get_distinct_keys() {
    let h = harness(HarnessOptions::default()).await;

    let mut keys = Vec::new();
    for _ in 0..2 {
        let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
        let outcome = h
            .pipeline
            .ingest(authorized, Some("video/mp4"), body(b"same bytes"))
            .await
            .unwrap();
        keys.push(outcome.key);
    }

    assert_ne!(keys[0], keys[1]);
    assert_eq!(files_under(h.storage_dir.path()).len(), 2);
}

#[tokio::test]
async fn test_thumbnail_upload_updates_record() {
    let h = harness(HarnessOptions::default()).await;
    let assets_dir = tempfile::tempdir().unwrap();
    let assets: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            assets_dir.path(),
            "http://localhost:8091/assets".to_string(),
        )
        .await
        .unwrap(),
    );
    let thumbnails = ThumbnailService::new(assets, h.videos.clone());

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let video = thumbnails
        .upload(authorized, Some("image/png"), body(b"\x89PNG\r\n\x1a\n"))
        .await
        .unwrap();

    let url = video.thumbnail_url.unwrap();
    let name = url
        .strip_prefix("http://localhost:8091/assets/")
        .expect("thumbnail served from assets");
    assert!(name.ends_with(".png"));
    assert!(assets_dir.path().join(name).exists());
    assert_eq!(video.video_url, None);
}

#[tokio::test]
async fn test_thumbnail_rejects_non_image() {
    let h = harness(HarnessOptions::default()).await;
    let assets_dir = tempfile::tempdir().unwrap();
    let assets: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(assets_dir.path(), "http://localhost:8091/assets".to_string())
            .await
            .unwrap(),
    );
    let thumbnails = ThumbnailService::new(assets, h.videos.clone()).with_max_bytes(4);

    let authorized = h.pipeline.authorize(h.video.id, h.owner).await.unwrap();
    let err = thumbnails
        .upload(authorized.clone(), Some("image/gif"), body(b"GIF8"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = thumbnails
        .upload(authorized, Some("image/jpeg"), body(b"too large"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PayloadTooLarge(_)));
    assert!(files_under(assets_dir.path()).is_empty());
}
