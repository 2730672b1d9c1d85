//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Errors are built through
//! [`crate::state::AppState::http_error`] so the environment decides whether
//! `details` are rendered.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tubely_core::{AppError, ErrorMetadata, LogLevel};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `AppError` (from tubely-core) can implement `IntoResponse`.
#[derive(Debug)]
pub struct HttpAppError {
    error: AppError,
    expose_details: bool,
}

impl HttpAppError {
    pub fn new(error: AppError, expose_details: bool) -> Self {
        Self {
            error,
            expose_details,
        }
    }
}

/// Details stay hidden unless the caller opted in via [`HttpAppError::new`].
impl From<AppError> for HttpAppError {
    fn from(error: AppError) -> Self {
        HttpAppError::new(error, false)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

impl ErrorResponse {
    fn from_app_error(error: &AppError, expose_details: bool) -> Self {
        let show = expose_details && !error.is_sensitive();
        ErrorResponse {
            error: error.client_message(),
            code: error.error_code().to_string(),
            details: show.then(|| error.detailed_message()),
            error_type: show.then(|| error.error_type().to_string()),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&self.error);

        let body = ErrorResponse::from_app_error(&self.error, self.expose_details);
        (status, Json(body)).into_response()
    }
}
