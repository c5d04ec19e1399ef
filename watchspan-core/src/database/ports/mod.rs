//! Repository ports (interfaces) grouped by bounded concern.
//! These keep the progress domain separate from its collaborators: the video
//! catalog and the watch list are owned by the embedding system and reached
//! only through these traits. Implementations live in the Postgres adapter
//! under `database::infrastructure::postgres`.

pub mod videos;
pub mod watch_list;
pub mod watch_progress;

pub use videos::VideosRepository;
pub use watch_list::WatchListRepository;
pub use watch_progress::{ProgressRecord, WatchProgressRepository};
