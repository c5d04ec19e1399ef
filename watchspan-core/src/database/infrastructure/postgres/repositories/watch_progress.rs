use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::ports::watch_progress::{
    ProgressRecord, WatchProgressRepository,
};
use crate::domain::intervals::{self, DEFAULT_GAP_TOLERANCE};
use crate::error::{ProgressError, Result};
use watchspan_model::{Interval, ProgressSnapshot, UserId, VideoId};

#[derive(Clone, Debug)]
pub struct PostgresWatchProgressRepository {
    pool: PgPool,
}

impl PostgresWatchProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn record_from_row(row: &PgRow) -> Result<ProgressRecord> {
        Ok(ProgressRecord {
            id: row.try_get("id")?,
            user_id: UserId(row.try_get("user_id")?),
            video_id: VideoId(row.try_get("video_id")?),
            percentage: row.try_get("percentage")?,
            last_watched_position: row.try_get("last_watched_position")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn intervals_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        progress_id: Uuid,
    ) -> Result<Vec<Interval>> {
        let rows = sqlx::query(
            r#"
            SELECT start_seconds, end_seconds
            FROM watch_intervals
            WHERE progress_id = $1
            ORDER BY start_seconds
            "#,
        )
        .bind(progress_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| {
            ProgressError::Internal(format!(
                "Failed to load stored intervals: {}",
                e
            ))
        })?;

        let mut intervals = Vec::with_capacity(rows.len());
        for row in rows {
            intervals.push(Interval::new(
                row.try_get("start_seconds")?,
                row.try_get("end_seconds")?,
            ));
        }
        Ok(intervals)
    }
}

#[async_trait]
impl WatchProgressRepository for PostgresWatchProgressRepository {
    async fn get_or_create(
        &self,
        user_id: UserId,
        video_id: VideoId,
    ) -> Result<ProgressRecord> {
        // The no-op DO UPDATE makes RETURNING yield the existing row on
        // conflict.
        let row = sqlx::query(
            r#"
            INSERT INTO watch_progress (
                id, user_id, video_id, percentage, last_watched_position, updated_at
            )
            VALUES ($1, $2, $3, 0, 0, NOW())
            ON CONFLICT (user_id, video_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, video_id, percentage, last_watched_position, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id.to_uuid())
        .bind(video_id.to_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            ProgressError::Internal(format!(
                "Failed to get or create progress record: {}",
                e
            ))
        })?;

        Self::record_from_row(&row)
    }

    async fn get(
        &self,
        user_id: UserId,
        video_id: VideoId,
    ) -> Result<Option<ProgressRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, video_id, percentage, last_watched_position, updated_at
            FROM watch_progress
            WHERE user_id = $1 AND video_id = $2
            "#,
        )
        .bind(user_id.to_uuid())
        .bind(video_id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            ProgressError::Internal(format!(
                "Failed to fetch progress record: {}",
                e
            ))
        })?;

        row.map(|row| Self::record_from_row(&row)).transpose()
    }

    async fn list_intervals(&self, progress_id: Uuid) -> Result<Vec<Interval>> {
        let rows = sqlx::query(
            r#"
            SELECT start_seconds, end_seconds
            FROM watch_intervals
            WHERE progress_id = $1
            ORDER BY start_seconds
            "#,
        )
        .bind(progress_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            ProgressError::Internal(format!("Failed to list intervals: {}", e))
        })?;

        let mut intervals = Vec::with_capacity(rows.len());
        for row in rows {
            intervals.push(Interval::new(
                row.try_get("start_seconds")?,
                row.try_get("end_seconds")?,
            ));
        }
        Ok(intervals)
    }

    async fn recalculate(
        &self,
        user_id: UserId,
        video_id: VideoId,
        new_intervals: &[Interval],
        playhead: Option<f64>,
        duration: f64,
    ) -> Result<ProgressSnapshot> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            ProgressError::Internal(format!("Failed to start transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO watch_progress (
                id, user_id, video_id, percentage, last_watched_position, updated_at
            )
            VALUES ($1, $2, $3, 0, 0, NOW())
            ON CONFLICT (user_id, video_id) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id.to_uuid())
        .bind(video_id.to_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            ProgressError::Internal(format!(
                "Failed to create progress record: {}",
                e
            ))
        })?;

        // Row lock scoped to this (user, video) pair: concurrent reports for
        // the same pair serialize here, other pairs pass through untouched.
        let row = sqlx::query(
            r#"
            SELECT id, last_watched_position
            FROM watch_progress
            WHERE user_id = $1 AND video_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id.to_uuid())
        .bind(video_id.to_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            ProgressError::Internal(format!(
                "Failed to lock progress record: {}",
                e
            ))
        })?;
        let progress_id: Uuid = row.try_get("id")?;
        let prior_position: f64 = row.try_get("last_watched_position")?;

        let mut combined = Self::intervals_in_tx(&mut tx, progress_id).await?;
        combined.extend_from_slice(new_intervals);
        let merged = intervals::merge(&combined, DEFAULT_GAP_TOLERANCE);

        // Dropping the transaction on the error paths below rolls everything
        // back; the prior stored state stays intact.
        intervals::check_canonical(&merged, duration, DEFAULT_GAP_TOLERANCE)
            .map_err(|msg| {
                warn!(
                    user_id = %user_id,
                    video_id = %video_id,
                    "aborting progress replace: {msg}"
                );
                ProgressError::InvariantViolation(msg)
            })?;

        let percentage = if duration > 0.0 {
            intervals::covered_duration(&merged, DEFAULT_GAP_TOLERANCE)
                / duration
                * 100.0
        } else {
            0.0
        };
        if !(0.0..=100.0).contains(&percentage) {
            warn!(
                user_id = %user_id,
                video_id = %video_id,
                percentage,
                "aborting progress replace: percentage out of range"
            );
            return Err(ProgressError::InvariantViolation(format!(
                "percentage {} outside [0, 100]",
                percentage
            )));
        }

        sqlx::query("DELETE FROM watch_intervals WHERE progress_id = $1")
            .bind(progress_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ProgressError::Internal(format!(
                    "Failed to clear stored intervals: {}",
                    e
                ))
            })?;

        for interval in &merged {
            sqlx::query(
                r#"
                INSERT INTO watch_intervals (id, progress_id, start_seconds, end_seconds)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(progress_id)
            .bind(interval.start)
            .bind(interval.end)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                ProgressError::Internal(format!(
                    "Failed to insert merged interval: {}",
                    e
                ))
            })?;
        }

        let last_watched_position = playhead.unwrap_or(prior_position);
        sqlx::query(
            r#"
            UPDATE watch_progress
            SET percentage = $2, last_watched_position = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(progress_id)
        .bind(percentage)
        .bind(last_watched_position)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            ProgressError::Internal(format!(
                "Failed to update progress fields: {}",
                e
            ))
        })?;

        tx.commit().await.map_err(|e| {
            ProgressError::Internal(format!("Failed to commit transaction: {}", e))
        })?;

        info!(
            user_id = %user_id,
            video_id = %video_id,
            intervals = merged.len(),
            percentage,
            "replaced stored interval set"
        );

        Ok(ProgressSnapshot {
            percentage,
            last_watched_position,
            intervals: merged,
        })
    }
}
