//! Scoped activation of the job processor
//!
//! [`JobQueueProvider::mount`] activates a processor exactly once. The
//! processor stays active until the provider is unmounted or dropped, at which
//! point its shutdown token is cancelled. The provider carries no data for
//! the code it wraps.

use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

/// A background processor that can be switched on for a scope
pub trait ProcessorActivation {
    /// Start processing until `shutdown` is cancelled
    ///
    /// The returned handle completes once the processor has stopped.
    fn activate(&self, shutdown: CancellationToken) -> JoinHandle<()>;
}

/// Keeps a processor active for as long as it lives
#[must_use = "the processor stops when the provider is dropped"]
#[derive(Debug)]
pub struct JobQueueProvider {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
    _guard: DropGuard,
}

impl JobQueueProvider {
    /// Activate `processor` and keep it active for the provider's lifetime
    pub fn mount<P: ProcessorActivation + ?Sized>(processor: &P) -> Self {
        let shutdown = CancellationToken::new();
        let handle = processor.activate(shutdown.clone());
        debug!("Job processor activated");
        Self {
            _guard: shutdown.clone().drop_guard(),
            shutdown,
            handle,
        }
    }

    /// Whether the processor has neither been asked to stop nor stopped
    pub fn is_active(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.handle.is_finished()
    }

    /// Token cancelled when the provider goes away
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Stop the processor and wait for it to finish
    pub async fn unmount(self) {
        let Self {
            shutdown,
            handle,
            _guard,
        } = self;
        shutdown.cancel();
        if let Err(e) = handle.await {
            warn!(error = %e, "Job processor ended abnormally");
        }
        debug!("Job processor deactivated");
    }
}
