use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use tubely_core::constants::THUMBNAIL_FORM_FIELD;
use tubely_core::{AppError, Video};

use super::{multipart_error, parse_video_id};
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video record ID (UUID)")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = Video),
        (status = 400, description = "Invalid ID, content type or size", body = ErrorResponse),
        (status = 401, description = "Missing/invalid token or not the owner", body = ErrorResponse),
        (status = 404, description = "Video record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    auth: Result<AuthUser, HttpAppError>,
    mut multipart: Multipart,
) -> Result<Json<Video>, HttpAppError> {
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
        if field.name() != Some(THUMBNAIL_FORM_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let video = state
            .thumbnails
            .upload(authorized, content_type.as_deref(), field)
            .await
            .map_err(|e| state.http_error(e))?;

        return Ok(Json(video));
    }

    Err(state.http_error(AppError::InvalidInput(format!(
        "Missing form field '{}'",
        THUMBNAIL_FORM_FIELD
    ))))
}
