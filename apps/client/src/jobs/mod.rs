//! Background job processing
//!
//! - [`JobQueue`] admits jobs and runs them with bounded concurrency and retry
//! - [`JobQueueProvider`] scopes one processor activation to its own lifetime
//! - [`RefreshUserDirectory`] reloads the cached user directory

mod provider;
mod queue;
mod refresh_users;

pub use provider::{JobQueueProvider, ProcessorActivation};
pub use queue::{JobQueue, JobQueueStats};
pub use refresh_users::RefreshUserDirectory;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;

/// A unit of background work
pub trait Job: Send + Sync + 'static {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run the job once
    ///
    /// Failures whose error is retryable are retried by the queue.
    fn run(&self) -> BoxFuture<'_, ClientResult<()>>;
}

/// Job queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQueueConfig {
    /// Maximum number of jobs running at once
    pub max_concurrent_jobs: usize,

    /// Retries after the first attempt for retryable failures
    pub max_retries: u32,

    /// Base delay of the exponential retry backoff, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 1,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}
