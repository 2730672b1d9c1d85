//! Video ingestion: stage → probe → remux → derive key → publish → record.

use bytes::Bytes;
use futures::Stream;
use tempfile::TempPath;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use uuid::Uuid;

use tubely_core::{AppError, ErrorMetadata, LogLevel, ProbeResult, Video};
use tubely_db::{authorize_video_owner, AuthorizedVideo, VideoRepository};
use tubely_storage::{ObjectKey, Storage};

use super::probe::MediaInspector;
use super::remux::{processed_output_path, Remuxer};
use crate::upload::UploadStager;

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Received,
    Staged,
    Probed,
    Remuxed,
    KeyDerived,
    Published,
    Recorded,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Staged => "staged",
            PipelineStage::Probed => "probed",
            PipelineStage::Remuxed => "remuxed",
            PipelineStage::KeyDerived => "key_derived",
            PipelineStage::Published => "published",
            PipelineStage::Recorded => "recorded",
        };
        f.write_str(name)
    }
}

/// A pipeline run that stopped before `Recorded`.
///
/// `stage` is the state that could not be reached.
#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    pub error: AppError,
}

impl Display for PipelineFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "pipeline failed before {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineFailure {}

impl From<PipelineFailure> for AppError {
    fn from(failure: PipelineFailure) -> Self {
        failure.error
    }
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub video: Video,
    pub key: String,
    pub url: String,
    pub probe: ProbeResult,
    pub size_bytes: u64,
}

pub struct VideoIngestPipeline {
    stager: UploadStager,
    inspector: Arc<dyn MediaInspector>,
    remuxer: Arc<dyn Remuxer>,
    storage: Arc<dyn Storage>,
    videos: Arc<dyn VideoRepository>,
}

impl VideoIngestPipeline {
    pub fn new(
        stager: UploadStager,
        inspector: Arc<dyn MediaInspector>,
        remuxer: Arc<dyn Remuxer>,
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoRepository>,
    ) -> Self {
        Self {
            stager,
            inspector,
            remuxer,
            storage,
            videos,
        }
    }

    /// Ownership gate. Runs before any resource is created.
    pub async fn authorize(
        &self,
        video_id: Uuid,
        user_id: Uuid,
    ) -> Result<AuthorizedVideo, AppError> {
        authorize_video_owner(self.videos.as_ref(), video_id, user_id).await
    }

    /// Run the pipeline for an already authorized upload.
    ///
    /// The record is only updated after the object has been written. Both
    /// temporary files are removed before this returns, on every path,
    /// including when the returned future is dropped early.
    pub async fn ingest<S, E>(
        &self,
        authorized: AuthorizedVideo,
        content_type: Option<&str>,
        body: S,
    ) -> Result<IngestOutcome, PipelineFailure>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display,
    {
        let video_id = authorized.video_id();
        let start = std::time::Instant::now();

        tracing::info!(
            video_id = %video_id,
            user_id = %authorized.user_id(),
            stage = %PipelineStage::Received,
            "Video upload received"
        );

        let staged = self
            .stager
            .stage(content_type, body)
            .await
            .map_err(|e| fail(video_id, PipelineStage::Staged, e))?;

        tracing::info!(
            video_id = %video_id,
            stage = %PipelineStage::Staged,
            size_bytes = staged.size(),
            path = %staged.path().display(),
            "Upload staged"
        );

        let probe = self
            .inspector
            .probe(staged.path())
            .await
            .map_err(|e| fail(video_id, PipelineStage::Probed, e))?;

        tracing::info!(
            video_id = %video_id,
            stage = %PipelineStage::Probed,
            width = probe.width,
            height = probe.height,
            orientation = %probe.orientation,
            "Video probed"
        );

        // Taken before the tool runs so a dropped request still removes partial output.
        let pending = TempPath::from_path(processed_output_path(staged.path()));
        let processed = self
            .remuxer
            .fast_start(staged.path())
            .await
            .map(TempPath::from_path)
            .map_err(|e| fail(video_id, PipelineStage::Remuxed, e))?;

        tracing::info!(
            video_id = %video_id,
            stage = %PipelineStage::Remuxed,
            path = %processed.display(),
            "Video remuxed for fast start"
        );

        let key = ObjectKey::derive(probe.orientation, staged.extension()).to_string();

        tracing::debug!(
            video_id = %video_id,
            stage = %PipelineStage::KeyDerived,
            key = %key,
            "Object key derived"
        );

        let url = self
            .storage
            .upload_file(&key, &processed, staged.content_type())
            .await
            .map_err(|e| {
                fail(
                    video_id,
                    PipelineStage::Published,
                    AppError::Publish(e.to_string()),
                )
            })?;

        tracing::info!(
            video_id = %video_id,
            stage = %PipelineStage::Published,
            key = %key,
            url = %url,
            "Video published"
        );

        let video = match self.videos.update_video_url(video_id, &url).await {
            Ok(video) => video,
            Err(e) => {
                tracing::error!(
                    video_id = %video_id,
                    key = %key,
                    url = %url,
                    error = %e,
                    "Video published but record update failed; object is orphaned"
                );
                let error = match e {
                    AppError::Persistence(_) => e,
                    other => AppError::Persistence(other.to_string()),
                };
                return Err(fail(video_id, PipelineStage::Recorded, error));
            }
        };

        let size_bytes = staged.size();
        drop(processed);
        drop(pending);
        drop(staged);

        tracing::info!(
            video_id = %video_id,
            stage = %PipelineStage::Recorded,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video ingestion completed"
        );

        Ok(IngestOutcome {
            video,
            key,
            url,
            probe,
            size_bytes,
        })
    }
}

fn fail(video_id: Uuid, stage: PipelineStage, error: AppError) -> PipelineFailure {
    match error.log_level() {
        LogLevel::Error => tracing::error!(
            video_id = %video_id,
            stage = %stage,
            error_type = error.error_type(),
            error = %error,
            "Video ingestion failed"
        ),
        LogLevel::Warn => tracing::warn!(
            video_id = %video_id,
            stage = %stage,
            error_type = error.error_type(),
            error = %error,
            "Video ingestion failed"
        ),
        LogLevel::Debug => tracing::debug!(
            video_id = %video_id,
            stage = %stage,
            error_type = error.error_type(),
            error = %error,
            "Video ingestion rejected"
        ),
    }
    PipelineFailure { stage, error }
}
