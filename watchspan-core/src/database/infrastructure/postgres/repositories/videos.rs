use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::database::ports::videos::VideosRepository;
use crate::error::{ProgressError, Result};
use watchspan_model::{Video, VideoId};

#[derive(Clone, Debug)]
pub struct PostgresVideosRepository {
    pool: PgPool,
}

impl PostgresVideosRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VideosRepository for PostgresVideosRepository {
    async fn get_video(&self, video_id: VideoId) -> Result<Option<Video>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, duration
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(video_id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            ProgressError::Internal(format!("Failed to fetch video: {}", e))
        })?;

        row.map(|row| {
            Ok(Video {
                id: VideoId(row.try_get("id")?),
                title: row.try_get("title")?,
                duration: row.try_get("duration")?,
            })
        })
        .transpose()
    }
}
