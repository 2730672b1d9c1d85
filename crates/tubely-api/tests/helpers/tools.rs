//! Scripted stand-ins for ffprobe and ffmpeg.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tubely_core::{AppError, ProbeResult};
use tubely_processing::{processed_output_path, MediaInspector, Remuxer};

pub struct ScriptedInspector {
    aspect_ratio: Option<&'static str>,
}

impl ScriptedInspector {
    pub fn new(aspect_ratio: Option<&'static str>) -> Self {
        Self { aspect_ratio }
    }
}

#[async_trait]
impl MediaInspector for ScriptedInspector {
    async fn probe(&self, _path: &Path) -> Result<ProbeResult, AppError> {
        Ok(ProbeResult::new(
            1280,
            720,
            self.aspect_ratio.map(str::to_string),
        ))
    }
}

pub struct ScriptedRemuxer {
    fail: bool,
}

impl ScriptedRemuxer {
    pub fn new(fail: bool) -> Self {
        Self { fail }
    }
}

#[async_trait]
impl Remuxer for ScriptedRemuxer {
    async fn fast_start(&self, input: &Path) -> Result<PathBuf, AppError> {
        if self.fail {
            return Err(AppError::Remux("ffmpeg exited with status 1".to_string()));
        }
        let output = processed_output_path(input);
        tokio::fs::copy(input, &output).await?;
        Ok(output)
    }
}
