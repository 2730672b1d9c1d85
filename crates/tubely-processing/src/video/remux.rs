//! Fast-start remux: stream-copy every track and move the index to the front.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tubely_core::constants::PROCESSED_MARKER;
use tubely_core::AppError;

use super::command::run_tool;

#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Write a fast-start copy of `input` and return its path.
    ///
    /// `input` is never modified. Implementations that write to disk should
    /// use [`processed_output_path`].
    async fn fast_start(&self, input: &Path) -> Result<PathBuf, AppError>;
}

/// `dir/name.ext` → `dir/name.processed.ext`.
pub fn processed_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{}.{}.{}", stem, PROCESSED_MARKER, ext.to_string_lossy()),
        None => format!("{}.{}", stem, PROCESSED_MARKER),
    };
    input.with_file_name(file_name)
}

pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn fast_start(&self, input: &Path) -> Result<PathBuf, AppError> {
        let start = std::time::Instant::now();
        let output = processed_output_path(input);

        let args: [&OsStr; 10] = [
            OsStr::new("-y"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            output.as_os_str(),
        ];

        if let Err(failure) = run_tool(&self.ffmpeg_path, args, self.timeout).await {
            if let Err(e) = tokio::fs::remove_file(&output).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        error = %e,
                        path = %output.display(),
                        "Failed to remove partial remux output"
                    );
                }
            }
            return Err(AppError::Remux(format!("ffmpeg {}", failure)));
        }

        tracing::info!(
            output = %output.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fast-start remux completed"
        );

        Ok(output)
    }
}
