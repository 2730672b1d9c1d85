use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use tubely_core::{AppError, Video};
use uuid::Uuid;

use crate::repository::VideoRepository;

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self))]
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    async fn create_video(&self, video: &Video) -> Result<Video, AppError> {
        let row = sqlx::query_as::<Postgres, Video>(
            r#"
            INSERT INTO videos (
                id, created_at, updated_at, title, description,
                thumbnail_url, video_url, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(video.created_at)
        .bind(video.updated_at)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(video_id = %row.id, user_id = %row.user_id, "Video record created");

        Ok(row)
    }

    #[tracing::instrument(skip(self))]
    async fn update_video_url(&self, id: Uuid, video_url: &str) -> Result<Video, AppError> {
        sqlx::query_as::<Postgres, Video>(
            "UPDATE videos SET video_url = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(video_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self))]
    async fn update_thumbnail_url(
        &self,
        id: Uuid,
        thumbnail_url: &str,
    ) -> Result<Video, AppError> {
        sqlx::query_as::<Postgres, Video>(
            "UPDATE videos SET thumbnail_url = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(thumbnail_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }
}
