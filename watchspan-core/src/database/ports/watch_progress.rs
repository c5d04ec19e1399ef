use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use watchspan_model::{Interval, ProgressSnapshot, UserId, VideoId};

/// One progress record per `(user, video)` pair.
///
/// `percentage` and `last_watched_position` are derived state maintained by
/// the recalculation cycle; the canonical interval rows hang off `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub video_id: VideoId,
    pub percentage: f64,
    pub last_watched_position: f64,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchProgressRepository: Send + Sync {
    /// Get the progress record for a pair, creating a fresh one (percentage 0,
    /// playhead 0, no intervals) if none exists yet.
    async fn get_or_create(
        &self,
        user_id: UserId,
        video_id: VideoId,
    ) -> Result<ProgressRecord>;

    /// Read the progress record for a pair, if one exists.
    async fn get(
        &self,
        user_id: UserId,
        video_id: VideoId,
    ) -> Result<Option<ProgressRecord>>;

    /// Stored canonical interval set for a progress record, ordered by start.
    async fn list_intervals(&self, progress_id: Uuid) -> Result<Vec<Interval>>;

    /// The locked read-merge-replace cycle: get-or-create the record, lock its
    /// row, merge the stored intervals with `new_intervals`, replace the
    /// stored rows with the merged set, and persist the recomputed percentage
    /// and (when `playhead` is set) the playhead — all in one transaction.
    ///
    /// Reading "existing" under the same row lock as the replace is what
    /// serializes concurrent reports for one pair; without it, two reports
    /// could merge against the same stale base and one submission's intervals
    /// would be silently lost. Any failure rolls the whole cycle back.
    async fn recalculate(
        &self,
        user_id: UserId,
        video_id: VideoId,
        new_intervals: &[Interval],
        playhead: Option<f64>,
        duration: f64,
    ) -> Result<ProgressSnapshot>;
}
