//! Progress recalculation service
//!
//! Orchestrates one progress report end to end: request-shape validation,
//! video lookup, watch-list gate, playhead clamping, per-element interval
//! filtering, then the repository's locked read-merge-replace cycle. The
//! service holds no state of its own; everything durable lives behind the
//! repository ports.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::database::ports::{
    VideosRepository, WatchListRepository, WatchProgressRepository,
};
use crate::domain::intervals;
use crate::error::{ProgressError, Result};
use watchspan_model::{
    Interval, ProgressReport, ProgressSnapshot, UserId, VideoId,
};

#[derive(Clone)]
pub struct ProgressService {
    videos: Arc<dyn VideosRepository>,
    watch_list: Arc<dyn WatchListRepository>,
    progress: Arc<dyn WatchProgressRepository>,
}

impl fmt::Debug for ProgressService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressService").finish_non_exhaustive()
    }
}

impl ProgressService {
    pub fn new(
        videos: Arc<dyn VideosRepository>,
        watch_list: Arc<dyn WatchListRepository>,
        progress: Arc<dyn WatchProgressRepository>,
    ) -> Self {
        Self {
            videos,
            watch_list,
            progress,
        }
    }

    /// Apply one progress report for `user_id` and return the updated
    /// snapshot.
    ///
    /// Fails with `BadRequest` when the report names no video, `NotFound` for
    /// an unknown video, and `Forbidden` when the pair is not on the user's
    /// watch list. Malformed interval elements and out-of-range playhead
    /// values are dropped silently; they never fail the report.
    ///
    /// Idempotent: resubmitting an identical report against unchanged stored
    /// state yields the same stored intervals and percentage.
    pub async fn report_progress(
        &self,
        user_id: UserId,
        report: &ProgressReport,
    ) -> Result<ProgressSnapshot> {
        let video_id = report.video_id.ok_or_else(|| {
            ProgressError::BadRequest("video_id is required".to_string())
        })?;

        let video = self
            .videos
            .get_video(video_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound(format!("video {}", video_id)))?;

        if !self.watch_list.is_in_list(user_id, video_id).await? {
            return Err(ProgressError::Forbidden(format!(
                "video {} is not in the watch list of user {}",
                video_id, user_id
            )));
        }

        // Best-effort telemetry: a missing or out-of-range playhead leaves the
        // stored position unchanged, it never fails the report.
        let playhead = report
            .current_time
            .filter(|t| t.is_finite() && *t >= 0.0 && *t <= video.duration);
        if report.current_time.is_some() && playhead.is_none() {
            debug!(
                current_time = report.current_time,
                duration = video.duration,
                "ignoring out-of-range playhead"
            );
        }

        let new_intervals =
            intervals::filter_reported(&report.intervals, video.duration);

        let snapshot = self
            .progress
            .recalculate(user_id, video_id, &new_intervals, playhead, video.duration)
            .await?;

        info!(
            user_id = %user_id,
            video_id = %video_id,
            percentage = snapshot.percentage,
            intervals = snapshot.intervals.len(),
            "recalculated watch progress"
        );

        Ok(snapshot)
    }

    /// Stored canonical interval set for the pair.
    ///
    /// `NotFound` when the user has never reported progress for the video.
    pub async fn get_intervals(
        &self,
        user_id: UserId,
        video_id: VideoId,
    ) -> Result<Vec<Interval>> {
        let record = self
            .progress
            .get(user_id, video_id)
            .await?
            .ok_or_else(|| {
                ProgressError::NotFound(format!(
                    "no progress for video {} and user {}",
                    video_id, user_id
                ))
            })?;

        self.progress.list_intervals(record.id).await
    }

    /// Full snapshot of the stored progress record for the pair.
    pub async fn get_progress(
        &self,
        user_id: UserId,
        video_id: VideoId,
    ) -> Result<ProgressSnapshot> {
        let record = self
            .progress
            .get(user_id, video_id)
            .await?
            .ok_or_else(|| {
                ProgressError::NotFound(format!(
                    "no progress for video {} and user {}",
                    video_id, user_id
                ))
            })?;

        let intervals = self.progress.list_intervals(record.id).await?;

        Ok(ProgressSnapshot {
            percentage: record.percentage,
            last_watched_position: record.last_watched_position,
            intervals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ports::videos::MockVideosRepository;
    use crate::database::ports::watch_list::MockWatchListRepository;
    use crate::database::ports::watch_progress::MockWatchProgressRepository;
    use watchspan_model::{IntervalReport, Video};

    fn service_with(
        videos: MockVideosRepository,
        watch_list: MockWatchListRepository,
        progress: MockWatchProgressRepository,
    ) -> ProgressService {
        ProgressService::new(
            Arc::new(videos),
            Arc::new(watch_list),
            Arc::new(progress),
        )
    }

    fn fixture_video(id: VideoId, duration: f64) -> Video {
        Video {
            id,
            title: "Orientation".to_string(),
            duration,
        }
    }

    fn empty_snapshot() -> ProgressSnapshot {
        ProgressSnapshot {
            percentage: 0.0,
            last_watched_position: 0.0,
            intervals: Vec::new(),
        }
    }

    #[tokio::test]
    async fn missing_video_id_is_bad_request() {
        let service = service_with(
            MockVideosRepository::new(),
            MockWatchListRepository::new(),
            MockWatchProgressRepository::new(),
        );

        let err = service
            .report_progress(UserId::new(), &ProgressReport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let mut videos = MockVideosRepository::new();
        videos.expect_get_video().returning(|_| Ok(None));

        let service = service_with(
            videos,
            MockWatchListRepository::new(),
            MockWatchProgressRepository::new(),
        );

        let report = ProgressReport {
            video_id: Some(VideoId::new()),
            ..Default::default()
        };
        let err = service
            .report_progress(UserId::new(), &report)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::NotFound(_)));
    }

    #[tokio::test]
    async fn pair_outside_watch_list_is_forbidden() {
        let video_id = VideoId::new();
        let mut videos = MockVideosRepository::new();
        videos
            .expect_get_video()
            .returning(move |id| Ok(Some(fixture_video(id, 100.0))));
        let mut watch_list = MockWatchListRepository::new();
        watch_list.expect_is_in_list().returning(|_, _| Ok(false));

        let service = service_with(
            videos,
            watch_list,
            MockWatchProgressRepository::new(),
        );

        let report = ProgressReport {
            video_id: Some(video_id),
            ..Default::default()
        };
        let err = service
            .report_progress(UserId::new(), &report)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::Forbidden(_)));
    }

    #[tokio::test]
    async fn malformed_elements_are_filtered_before_the_store_sees_them() {
        let video_id = VideoId::new();
        let mut videos = MockVideosRepository::new();
        videos
            .expect_get_video()
            .returning(move |id| Ok(Some(fixture_video(id, 100.0))));
        let mut watch_list = MockWatchListRepository::new();
        watch_list.expect_is_in_list().returning(|_, _| Ok(true));

        let mut progress = MockWatchProgressRepository::new();
        progress
            .expect_recalculate()
            .withf(|_, _, new_intervals, _, _| {
                new_intervals == [Interval::new(0.0, 10.0)]
            })
            .returning(|_, _, _, _, _| Ok(empty_snapshot()));

        let service = service_with(videos, watch_list, progress);

        let report = ProgressReport {
            video_id: Some(video_id),
            current_time: None,
            intervals: vec![
                IntervalReport::new(0.0, 10.0),
                IntervalReport::new(10.0, 5.0),
                IntervalReport::new(50.0, 150.0),
            ],
        };
        service
            .report_progress(UserId::new(), &report)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn out_of_range_playhead_is_dropped() {
        let video_id = VideoId::new();
        let mut videos = MockVideosRepository::new();
        videos
            .expect_get_video()
            .returning(move |id| Ok(Some(fixture_video(id, 100.0))));
        let mut watch_list = MockWatchListRepository::new();
        watch_list.expect_is_in_list().returning(|_, _| Ok(true));

        let mut progress = MockWatchProgressRepository::new();
        progress
            .expect_recalculate()
            .withf(|_, _, _, playhead, _| playhead.is_none())
            .returning(|_, _, _, _, _| Ok(empty_snapshot()));

        let service = service_with(videos, watch_list, progress);

        let report = ProgressReport {
            video_id: Some(video_id),
            current_time: Some(250.0),
            intervals: Vec::new(),
        };
        service
            .report_progress(UserId::new(), &report)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn in_range_playhead_is_forwarded() {
        let video_id = VideoId::new();
        let mut videos = MockVideosRepository::new();
        videos
            .expect_get_video()
            .returning(move |id| Ok(Some(fixture_video(id, 100.0))));
        let mut watch_list = MockWatchListRepository::new();
        watch_list.expect_is_in_list().returning(|_, _| Ok(true));

        let mut progress = MockWatchProgressRepository::new();
        progress
            .expect_recalculate()
            .withf(|_, _, _, playhead, duration| {
                *playhead == Some(62.4) && *duration == 100.0
            })
            .returning(|_, _, _, _, _| Ok(empty_snapshot()));

        let service = service_with(videos, watch_list, progress);

        let report = ProgressReport {
            video_id: Some(video_id),
            current_time: Some(62.4),
            intervals: Vec::new(),
        };
        service
            .report_progress(UserId::new(), &report)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_intervals_without_record_is_not_found() {
        let mut progress = MockWatchProgressRepository::new();
        progress.expect_get().returning(|_, _| Ok(None));

        let service = service_with(
            MockVideosRepository::new(),
            MockWatchListRepository::new(),
            progress,
        );

        let err = service
            .get_intervals(UserId::new(), VideoId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::NotFound(_)));
    }
}
