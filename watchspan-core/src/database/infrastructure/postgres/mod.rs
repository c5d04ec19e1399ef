//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod repositories;

pub use repositories::videos::PostgresVideosRepository;
pub use repositories::watch_list::PostgresWatchListRepository;
pub use repositories::watch_progress::PostgresWatchProgressRepository;
