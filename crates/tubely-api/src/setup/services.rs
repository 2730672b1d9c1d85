//! Pipeline and service wiring

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{
    FfmpegRemuxer, FfprobeInspector, MediaInspector, Remuxer, StagingConfig, ThumbnailService,
    UploadStager, VideoIngestPipeline,
};
use tubely_storage::Storage;

use crate::state::AppState;

/// Build the ingestion pipeline with the ffprobe/ffmpeg tools from config.
pub async fn initialize_services(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    assets: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let inspector: Arc<dyn MediaInspector> = Arc::new(FfprobeInspector::new(
        config.ffprobe_path(),
        Duration::from_secs(config.probe_timeout_secs()),
    ));
    let remuxer: Arc<dyn Remuxer> = Arc::new(FfmpegRemuxer::new(
        config.ffmpeg_path(),
        Duration::from_secs(config.remux_timeout_secs()),
    ));

    tracing::info!(
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        probe_timeout_secs = config.probe_timeout_secs(),
        remux_timeout_secs = config.remux_timeout_secs(),
        "Media tools configured"
    );

    build_state(config, videos, storage, assets, inspector, remuxer).await
}

/// Assemble `AppState` around the given media tools.
pub async fn build_state(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    assets: Arc<dyn Storage>,
    inspector: Arc<dyn MediaInspector>,
    remuxer: Arc<dyn Remuxer>,
) -> Result<Arc<AppState>> {
    tokio::fs::create_dir_all(config.upload_temp_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create upload temp dir {}",
                config.upload_temp_dir().display()
            )
        })?;

    let stager = UploadStager::new(StagingConfig::video(config.upload_temp_dir().clone()));
    let ingest = VideoIngestPipeline::new(stager, inspector, remuxer, storage, videos.clone());
    let thumbnails = ThumbnailService::new(assets, videos);

    Ok(Arc::new(AppState {
        config: config.clone(),
        ingest: Arc::new(ingest),
        thumbnails: Arc::new(thumbnails),
    }))
}
