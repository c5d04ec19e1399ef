use async_trait::async_trait;

use crate::error::Result;
use watchspan_model::{Video, VideoId};

// Video metadata lookup. CRUD of the catalog itself belongs to the embedding
// system; the progress engine only ever needs a duration to validate against.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideosRepository: Send + Sync {
    async fn get_video(&self, video_id: VideoId) -> Result<Option<Video>>;
}
