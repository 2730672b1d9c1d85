//! Stream geometry via ffprobe.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tubely_core::{AppError, ProbeResult};

use super::command::run_tool;

#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Read the first stream's geometry and classify its orientation.
    async fn probe(&self, path: &Path) -> Result<ProbeResult, AppError>;
}

pub struct FfprobeInspector {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<ProbeResult, AppError> {
        let start = std::time::Instant::now();

        let output = run_tool(
            &self.ffprobe_path,
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-print_format"),
                OsStr::new("json"),
                OsStr::new("-show_streams"),
                path.as_os_str(),
            ],
            self.timeout,
        )
        .await
        .map_err(|e| AppError::Probe(format!("ffprobe {}", e)))?;

        let result = parse_probe_output(&output.stdout)?;

        tracing::info!(
            width = result.width,
            height = result.height,
            display_aspect_ratio = ?result.display_aspect_ratio,
            orientation = %result.orientation,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video probe completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    // Kept loose: a non-string value classifies as `Other` rather than failing.
    #[serde(default)]
    display_aspect_ratio: Option<serde_json::Value>,
}

/// Parse `ffprobe -print_format json -show_streams` output.
///
/// Invalid JSON or a missing first stream is `ProbeParse`. Missing or odd
/// geometry fields are tolerated and classify as `Other`.
pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeResult, AppError> {
    let parsed: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| AppError::ProbeParse(format!("Failed to parse ffprobe output: {}", e)))?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| AppError::ProbeParse("ffprobe reported no streams".to_string()))?;

    let aspect_ratio = match stream.display_aspect_ratio {
        Some(serde_json::Value::String(value)) => Some(value),
        _ => None,
    };

    Ok(ProbeResult::new(
        stream.width.unwrap_or(0),
        stream.height.unwrap_or(0),
        aspect_ratio,
    ))
}
