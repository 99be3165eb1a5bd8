//! Lumen media client core
//!
//! Client-side building blocks for a Jellyfin media client:
//!
//! - [`jobs`]: background job queue and its scoped activation
//! - [`users`]: cached user directory of the configured server
//! - [`orientation`]: shared screen orientation lock
//! - [`format`]: human-readable stream properties

pub mod config;
pub mod error;
pub mod format;
pub mod jobs;
pub mod orientation;
pub mod query;
pub mod users;

pub use config::Config;
pub use error::{ClientError, ClientResult, ErrorSeverity, JobResult};
pub use format::{format_bitrate, format_measured_bitrate};
pub use jobs::{
    Job, JobQueue, JobQueueConfig, JobQueueProvider, JobQueueStats, ProcessorActivation,
    RefreshUserDirectory,
};
pub use orientation::{OrientationLock, OrientationState};
pub use query::{QueryCache, QueryState};
pub use users::{UserDirectoryQuery, UserSource};
