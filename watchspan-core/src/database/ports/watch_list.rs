use async_trait::async_trait;

use crate::error::Result;
use watchspan_model::{UserId, VideoId};

// Watch-list membership gates who may report progress for a video. List
// management is the embedding system's concern; only the membership test is
// consumed here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchListRepository: Send + Sync {
    async fn is_in_list(&self, user_id: UserId, video_id: VideoId) -> Result<bool>;
}
