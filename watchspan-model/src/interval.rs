/// A closed time range `[start, end]` in seconds on a video's timeline.
///
/// Intervals are value types: two intervals with the same bounds are the same
/// interval. The stored canonical set for a progress record keeps them sorted
/// by `start` and pairwise separated by more than the gap tolerance; raw
/// client-reported intervals carry no such guarantee.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    /// Start of the watched range in seconds
    #[cfg_attr(feature = "serde", serde(rename = "start_time"))]
    pub start: f64,
    /// End of the watched range in seconds
    #[cfg_attr(feature = "serde", serde(rename = "end_time"))]
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Interval { start, end }
    }

    /// Seconds covered by this interval.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the bounds invariant `0 <= start < end <= duration` holds.
    pub fn is_within(&self, duration: f64) -> bool {
        self.start >= 0.0 && self.start < self.end && self.end <= duration
    }
}
