use std::fmt;
use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::database::infrastructure::postgres::{
    PostgresVideosRepository, PostgresWatchListRepository,
    PostgresWatchProgressRepository,
};
use crate::domain::progress::ProgressService;
use crate::error::{ProgressError, Result};

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
}

/// Postgres-backed store bundling the repository adapters over one pool.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
    min_connections: u32,
    videos: PostgresVideosRepository,
    watch_list: PostgresWatchListRepository,
    watch_progress: PostgresWatchProgressRepository,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn new(connection_string: &str) -> Result<Self> {
        // Pool configuration from environment or defaults sized to the host.
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(num_cpus::get() as u32);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1)
            .min(max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .max_lifetime(std::time::Duration::from_secs(1800))
            .idle_timeout(std::time::Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(connection_string)
            .await
            .map_err(|e| {
                ProgressError::Internal(format!(
                    "Failed to connect to database: {}",
                    e
                ))
            })?;

        info!(max_connections, min_connections, "connected to Postgres");

        Ok(Self::from_pool_with_limits(pool, max_connections, min_connections))
    }

    /// Wrap an existing pool; used by tests and embedders that own pooling.
    pub fn from_pool(pool: PgPool) -> Self {
        // Default limits for test pools
        Self::from_pool_with_limits(pool, 20, 5)
    }

    fn from_pool_with_limits(
        pool: PgPool,
        max_connections: u32,
        min_connections: u32,
    ) -> Self {
        Self {
            videos: PostgresVideosRepository::new(pool.clone()),
            watch_list: PostgresWatchListRepository::new(pool.clone()),
            watch_progress: PostgresWatchProgressRepository::new(pool.clone()),
            pool,
            max_connections,
            min_connections,
        }
    }

    /// Apply pending migrations from the crate's `migrations/` directory.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|e| {
            ProgressError::Internal(format!("Failed to run migrations: {}", e))
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
        }
    }

    pub fn videos(&self) -> &PostgresVideosRepository {
        &self.videos
    }

    pub fn watch_list(&self) -> &PostgresWatchListRepository {
        &self.watch_list
    }

    pub fn watch_progress(&self) -> &PostgresWatchProgressRepository {
        &self.watch_progress
    }

    /// Progress service wired to this database's repositories.
    pub fn service(&self) -> ProgressService {
        ProgressService::new(
            Arc::new(self.videos.clone()),
            Arc::new(self.watch_list.clone()),
            Arc::new(self.watch_progress.clone()),
        )
    }
}
