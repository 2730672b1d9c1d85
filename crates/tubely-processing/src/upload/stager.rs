//! Upload staging: bound the incoming body and spool it to a local file.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tubely_core::constants::{MAX_VIDEO_SIZE_BYTES, UPLOAD_TEMP_PREFIX, VIDEO_CONTENT_TYPE};
use tubely_core::AppError;

use super::content_type::{ensure_allowed_media_type, MediaType};

#[derive(Debug, Clone)]
pub struct StagingConfig {
    pub max_bytes: u64,
    pub temp_dir: PathBuf,
    pub allowed_content_types: Vec<&'static str>,
}

impl StagingConfig {
    /// MP4-only staging with the 1 GiB ceiling.
    pub fn video(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_bytes: MAX_VIDEO_SIZE_BYTES,
            temp_dir: temp_dir.into(),
            allowed_content_types: vec![VIDEO_CONTENT_TYPE],
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// A fully received upload on local disk. The file is deleted on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
    media_type: MediaType,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_type(&self) -> &str {
        self.media_type.essence()
    }

    pub fn extension(&self) -> &str {
        self.media_type.extension()
    }
}

#[derive(Debug, Clone)]
pub struct UploadStager {
    config: StagingConfig,
}

impl UploadStager {
    pub fn new(config: StagingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Validate the declared type, then drain `body` into a new temp file.
    ///
    /// Nothing touches the filesystem until the content type has passed.
    /// The body is rejected as soon as it grows past `max_bytes`; a stream
    /// error (client abort, truncated part) is reported as `Io`. In every
    /// failure case the partial file is removed before returning.
    #[tracing::instrument(skip(self, body), fields(max_bytes = self.config.max_bytes))]
    pub async fn stage<S, E>(
        &self,
        content_type: Option<&str>,
        body: S,
    ) -> Result<StagedFile, AppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display,
    {
        let media_type =
            ensure_allowed_media_type(content_type, &self.config.allowed_content_types)?;

        let named = tempfile::Builder::new()
            .prefix(UPLOAD_TEMP_PREFIX)
            .suffix(&format!(".{}", media_type.extension()))
            .tempfile_in(&self.config.temp_dir)?;
        let (std_file, path) = named.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut body = std::pin::pin!(body);
        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Io(format!("Upload stream failed: {}", e)))?;
            size += chunk.len() as u64;
            if size > self.config.max_bytes {
                tracing::debug!(
                    received_bytes = size,
                    path = %path.display(),
                    "Upload exceeded size limit"
                );
                return Err(AppError::PayloadTooLarge(format!(
                    "Upload exceeds the maximum size of {} bytes",
                    self.config.max_bytes
                )));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            content_type = %media_type.essence(),
            "Upload staged"
        );

        Ok(StagedFile {
            path,
            size,
            media_type,
        })
    }
}

/// Collect a small body into memory, failing once it passes `max_bytes`.
pub async fn read_bounded<S, E>(body: S, max_bytes: u64) -> Result<Bytes, AppError>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| AppError::Io(format!("Upload stream failed: {}", e)))?;
        if (buffer.len() + chunk.len()) as u64 > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload exceeds the maximum size of {} bytes",
                max_bytes
            )));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}
