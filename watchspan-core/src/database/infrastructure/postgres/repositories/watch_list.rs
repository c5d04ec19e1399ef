use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::ports::watch_list::WatchListRepository;
use crate::error::{ProgressError, Result};
use watchspan_model::{UserId, VideoId};

#[derive(Clone, Debug)]
pub struct PostgresWatchListRepository {
    pool: PgPool,
}

impl PostgresWatchListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WatchListRepository for PostgresWatchListRepository {
    async fn is_in_list(&self, user_id: UserId, video_id: VideoId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM watch_list
                WHERE user_id = $1 AND video_id = $2
            )
            "#,
        )
        .bind(user_id.to_uuid())
        .bind(video_id.to_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            ProgressError::Internal(format!(
                "Failed to check watch list membership: {}",
                e
            ))
        })?;

        Ok(exists)
    }
}
