use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tubely_core::constants::VIDEO_FORM_FIELD;
use tubely_core::AppError;

use super::{multipart_error, parse_video_id};
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Upload the video file for an existing record.
///
/// Checks run in order: path id, bearer token, ownership. Only then is the
/// multipart body read and handed to the ingestion pipeline.
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video record ID (UUID)")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 204, description = "Video processed, stored and recorded"),
        (status = 400, description = "Invalid ID, content type or size", body = ErrorResponse),
        (status = 401, description = "Missing/invalid token or not the owner", body = ErrorResponse),
        (status = 404, description = "Video record not found", body = ErrorResponse),
        (status = 500, description = "Processing, storage or database failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    auth: Result<AuthUser, HttpAppError>,
    mut multipart: Multipart,
) -> Result<StatusCode, HttpAppError> {
    let video_id = parse_video_id(&video_id).map_err(|e| state.http_error(e))?;
    let user = auth?;

    let authorized = state
        .ingest
        .authorize(video_id, user.user_id)
        .await
        .map_err(|e| state.http_error(e))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| state.http_error(multipart_error(e)))?
    {
        if field.name() != Some(VIDEO_FORM_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let outcome = state
            .ingest
            .ingest(authorized, content_type.as_deref(), field)
            .await
            .map_err(|e| state.http_error(e))?;

        tracing::info!(
            video_id = %video_id,
            key = %outcome.key,
            size_bytes = outcome.size_bytes,
            "Video upload accepted"
        );
        return Ok(StatusCode::NO_CONTENT);
    }

    Err(state.http_error(AppError::InvalidInput(format!(
        "Missing form field '{}'",
        VIDEO_FORM_FIELD
    ))))
}
