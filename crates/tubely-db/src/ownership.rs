//! Ownership gate in front of every upload path.

use tubely_core::{AppError, Video};
use uuid::Uuid;

use crate::repository::VideoRepository;

/// Proof that `user_id` owns `video`.
///
/// Only [`authorize_video_owner`] can build one, so any function taking an
/// `AuthorizedVideo` runs after the ownership check.
#[derive(Debug, Clone)]
pub struct AuthorizedVideo {
    video: Video,
    user_id: Uuid,
}

impl AuthorizedVideo {
    pub fn video(&self) -> &Video {
        &self.video
    }

    pub fn video_id(&self) -> Uuid {
        self.video.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// Load the record and check it belongs to `user_id`.
///
/// A missing record is `NotFound`; someone else's record is `Unauthorized`.
pub async fn authorize_video_owner(
    videos: &dyn VideoRepository,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<AuthorizedVideo, AppError> {
    let video = videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

    if !video.is_owned_by(user_id) {
        tracing::debug!(
            video_id = %video_id,
            user_id = %user_id,
            "Upload rejected: user does not own video"
        );
        return Err(AppError::Unauthorized(
            "Not authorized to update this video".to_string(),
        ));
    }

    Ok(AuthorizedVideo { video, user_id })
}
