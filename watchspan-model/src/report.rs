use crate::ids::VideoId;
use crate::interval::Interval;

/// One raw interval element as reported by a client.
///
/// Both bounds are optional at the wire level: clients under flaky playback
/// conditions send partial or junk elements, and a malformed element is
/// dropped during validation rather than failing the whole report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntervalReport {
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_time: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_time: Option<f64>,
}

impl IntervalReport {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        IntervalReport {
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }
}

impl From<Interval> for IntervalReport {
    fn from(interval: Interval) -> Self {
        IntervalReport::new(interval.start, interval.end)
    }
}

/// Progress report request
///
/// Sent by clients periodically during playback, typically every 10-30
/// seconds. `video_id` is required (a missing field is rejected as a bad
/// request); `current_time` and `intervals` are best-effort telemetry.
///
/// ```json
/// {
///   "video_id": "0198c5e6-1111-7000-8000-000000000001",
///   "current_time": 62.4,
///   "intervals": [{ "start_time": 30.0, "end_time": 62.4 }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressReport {
    #[cfg_attr(feature = "serde", serde(default))]
    pub video_id: Option<VideoId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub current_time: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub intervals: Vec<IntervalReport>,
}

/// Snapshot of a progress record after recalculation.
///
/// `intervals` is the canonical merged set, sorted by start. `percentage` is
/// derived from covered duration over the video duration and always lands in
/// `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    pub percentage: f64,
    pub last_watched_position: f64,
    pub intervals: Vec<Interval>,
}
