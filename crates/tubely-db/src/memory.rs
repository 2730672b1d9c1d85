use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tubely_core::{AppError, Video};
use uuid::Uuid;

use crate::repository::VideoRepository;

/// Process-local repository.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update_with<F>(&self, id: Uuid, apply: F) -> Result<Video, AppError>
    where
        F: FnOnce(&mut Video) + Send,
    {
        let mut videos = self.videos.write().await;
        let video = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        apply(video);
        video.updated_at = Utc::now();
        Ok(video.clone())
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn create_video(&self, video: &Video) -> Result<Video, AppError> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video.id) {
            return Err(AppError::InvalidInput(format!(
                "Video {} already exists",
                video.id
            )));
        }
        videos.insert(video.id, video.clone());
        Ok(video.clone())
    }

    async fn update_video_url(&self, id: Uuid, video_url: &str) -> Result<Video, AppError> {
        let video_url = video_url.to_string();
        self.update_with(id, move |video| video.video_url = Some(video_url))
            .await
    }

    async fn update_thumbnail_url(
        &self,
        id: Uuid,
        thumbnail_url: &str,
    ) -> Result<Video, AppError> {
        let thumbnail_url = thumbnail_url.to_string();
        self.update_with(id, move |video| video.thumbnail_url = Some(thumbnail_url))
            .await
    }
}
