use async_trait::async_trait;
use tubely_core::{AppError, Video};
use uuid::Uuid;

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    async fn create_video(&self, video: &Video) -> Result<Video, AppError>;

    /// Record the published locator. Fails with `NotFound` if the record is gone.
    async fn update_video_url(&self, id: Uuid, video_url: &str) -> Result<Video, AppError>;

    async fn update_thumbnail_url(&self, id: Uuid, thumbnail_url: &str)
        -> Result<Video, AppError>;
}
