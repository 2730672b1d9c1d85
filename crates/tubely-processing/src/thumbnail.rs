//! Thumbnail uploads: validated images written to the assets store.

use bytes::Bytes;
use futures::Stream;
use std::fmt::Display;
use std::sync::Arc;

use tubely_core::constants::{MAX_THUMBNAIL_SIZE_BYTES, THUMBNAIL_CONTENT_TYPES};
use tubely_core::{AppError, Video};
use tubely_db::{AuthorizedVideo, VideoRepository};
use tubely_storage::{random_token, Storage};

use crate::upload::{ensure_allowed_media_type, read_bounded};

pub struct ThumbnailService {
    assets: Arc<dyn Storage>,
    videos: Arc<dyn VideoRepository>,
    max_bytes: u64,
}

impl ThumbnailService {
    pub fn new(assets: Arc<dyn Storage>, videos: Arc<dyn VideoRepository>) -> Self {
        Self {
            assets,
            videos,
            max_bytes: MAX_THUMBNAIL_SIZE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Store the image as `{token}.{ext}` and point the record at it.
    #[tracing::instrument(skip(self, authorized, body), fields(video_id = %authorized.video_id()))]
    pub async fn upload<S, E>(
        &self,
        authorized: AuthorizedVideo,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, AppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display,
    {
        let media_type = ensure_allowed_media_type(content_type, THUMBNAIL_CONTENT_TYPES)?;
        let data = read_bounded(body, self.max_bytes).await?;

        let key = format!("{}.{}", random_token(), media_type.extension());
        let url = self
            .assets
            .upload_bytes(&key, data, media_type.essence())
            .await
            .map_err(|e| AppError::Publish(e.to_string()))?;

        let video = self
            .videos
            .update_thumbnail_url(authorized.video_id(), &url)
            .await?;

        tracing::info!(key = %key, url = %url, "Thumbnail stored");

        Ok(video)
    }
}
