//! Shared application state.

use std::sync::Arc;
use tubely_core::{AppError, Config};
use tubely_processing::{ThumbnailService, VideoIngestPipeline};

use crate::error::HttpAppError;

pub struct AppState {
    pub config: Config,
    pub ingest: Arc<VideoIngestPipeline>,
    pub thumbnails: Arc<ThumbnailService>,
}

impl AppState {
    /// Wrap an error for the response, exposing details outside production.
    pub fn http_error(&self, error: impl Into<AppError>) -> HttpAppError {
        HttpAppError::new(error.into(), !self.config.is_production())
    }
}
