pub mod health;
pub mod thumbnail_upload;
pub mod video_upload;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use tubely_core::AppError;
use uuid::Uuid;

/// Parse the `{videoID}` path segment.
pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid video ID".to_string()))
}

/// A body cut off by the route limit is a size error; anything else is malformed input.
pub(crate) fn multipart_error(error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(error.body_text())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", error.body_text()))
    }
}
