use crate::ids::VideoId;

/// Video record as surfaced by the lookup port.
///
/// Watchspan never inspects video content; `duration` is the fixed timeline
/// length every reported range is validated against. Metadata CRUD belongs to
/// the embedding system.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    /// Total duration in seconds
    pub duration: f64,
}
