//! # Watchspan Core
//!
//! Core library for Watchspan, tracking per-user watch progress on videos as
//! merged sets of watched time intervals collapsed into a completion
//! percentage.
//!
//! ## Overview
//!
//! - **Interval Merge Engine**: pure functions collapsing raw reported
//!   intervals into the minimal sorted, non-overlapping covering set, with a
//!   gap tolerance absorbing seek/playback jitter
//! - **Progress Recalculation**: per-report pipeline validating untrusted
//!   client telemetry and replacing the stored canonical set atomically
//! - **Repository Ports**: trait seams for the video catalog, watch-list
//!   membership, and progress storage collaborators
//! - **Postgres Adapters**: sqlx-backed implementations with row-level
//!   locking so concurrent reports for one `(user, video)` pair serialize
//!
//! ## Example
//!
//! ```no_run
//! use watchspan_core::database::PostgresDatabase;
//! use watchspan_model::{IntervalReport, ProgressReport, UserId, VideoId};
//!
//! async fn report(db: &PostgresDatabase, user: UserId, video: VideoId)
//! -> Result<(), Box<dyn std::error::Error>> {
//!     let service = db.service();
//!     let snapshot = service
//!         .report_progress(
//!             user,
//!             &ProgressReport {
//!                 video_id: Some(video),
//!                 current_time: Some(62.4),
//!                 intervals: vec![IntervalReport::new(30.0, 62.4)],
//!             },
//!         )
//!         .await?;
//!     println!("watched {:.1}%", snapshot.percentage);
//!     Ok(())
//! }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Database ports and the Postgres adapters implementing them
pub mod database;

/// Interval merge engine and progress recalculation service
pub mod domain;

/// Error types and error handling utilities
pub mod error;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use database::postgres::PostgresDatabase;
pub use domain::intervals::DEFAULT_GAP_TOLERANCE;
pub use domain::progress::ProgressService;
pub use error::{ProgressError, Result};
