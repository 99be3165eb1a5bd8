//! In-process job queue
//!
//! Jobs are admitted into an unbounded FIFO channel and picked up by a
//! processing loop that runs only while activated. At most
//! `max_concurrent_jobs` run at once. On shutdown the loop stops taking new
//! jobs and waits for running ones; jobs still queued stay queued for the
//! next activation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex, Notify, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{Job, JobQueueConfig, ProcessorActivation};
use crate::error::{ClientError, ClientResult, JobResult};

/// A job waiting in the queue
struct QueuedJob {
    id: Uuid,
    job: Arc<dyn Job>,
    enqueued_at: DateTime<Utc>,
}

/// Snapshot of the queue counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct JobQueueStats {
    /// Jobs admitted
    pub enqueued: u64,
    /// Jobs that succeeded
    pub completed: u64,
    /// Jobs that failed for good
    pub failed: u64,
    /// Retry attempts made
    pub retried: u64,
}

impl JobQueueStats {
    /// Jobs admitted but not yet finished
    pub fn pending(&self) -> u64 {
        self.enqueued
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

struct Inner {
    config: JobQueueConfig,
    sender: mpsc::UnboundedSender<QueuedJob>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    counters: Counters,
    finished: Notify,
}

/// Background job queue
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(JobQueueConfig::default())
    }
}

impl JobQueue {
    /// Create an idle queue
    pub fn new(config: JobQueueConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                config,
                sender,
                receiver: Arc::new(Mutex::new(receiver)),
                counters: Counters::default(),
                finished: Notify::new(),
            }),
        }
    }

    /// Queue settings
    pub fn config(&self) -> &JobQueueConfig {
        &self.inner.config
    }

    /// Admit a job, returning its ID
    ///
    /// The job runs once a processor is active.
    pub fn enqueue(&self, job: impl Job) -> ClientResult<Uuid> {
        self.enqueue_arc(Arc::new(job))
    }

    /// Admit a shared job, returning its ID
    pub fn enqueue_arc(&self, job: Arc<dyn Job>) -> ClientResult<Uuid> {
        let id = Uuid::new_v4();
        let name = job.name().to_string();
        let enqueued = &self.inner.counters.enqueued;
        enqueued.fetch_add(1, Ordering::SeqCst);
        let queued = QueuedJob {
            id,
            job,
            enqueued_at: Utc::now(),
        };
        if self.inner.sender.send(queued).is_err() {
            enqueued.fetch_sub(1, Ordering::SeqCst);
            return Err(ClientError::QueueClosed);
        }
        debug!(job_id = %id, job = %name, "Job enqueued");
        Ok(id)
    }

    /// Current counters
    pub fn stats(&self) -> JobQueueStats {
        let counters = &self.inner.counters;
        JobQueueStats {
            enqueued: counters.enqueued.load(Ordering::SeqCst),
            completed: counters.completed.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            retried: counters.retried.load(Ordering::SeqCst),
        }
    }

    /// Wait until every admitted job has finished
    ///
    /// Never returns while jobs are queued and no processor is active.
    pub async fn wait_until_idle(&self) {
        loop {
            let finished = self.inner.finished.notified();
            if self.stats().pending() == 0 {
                return;
            }
            finished.await;
        }
    }
}

impl ProcessorActivation for JobQueue {
    fn activate(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.process(shutdown))
    }
}

impl Inner {
    async fn process(self: Arc<Self>, shutdown: CancellationToken) {
        // One loop consumes the queue at a time; a new activation waits for
        // the previous loop to drain.
        let mut receiver = tokio::select! {
            receiver = Arc::clone(&self.receiver).lock_owned() => receiver,
            _ = shutdown.cancelled() => return,
        };

        info!(
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            max_retries = self.config.max_retries,
            "Job processor started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs.max(1)));
        let mut running: JoinSet<JobResult> = JoinSet::new();

        loop {
            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(finished) = running.join_next(), if !running.is_empty() => {
                    self.reap(finished);
                    continue;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let queued = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(finished) = running.join_next(), if !running.is_empty() => {
                    self.reap(finished);
                    continue;
                }
                queued = receiver.recv() => match queued {
                    Some(queued) => queued,
                    None => break,
                },
            };

            let inner = Arc::clone(&self);
            let token = shutdown.clone();
            running.spawn(async move {
                let _permit = permit;
                inner.run_job(queued, token).await
            });
        }

        debug!(running = running.len(), "Job processor stopping");
        while let Some(finished) = running.join_next().await {
            self.reap(finished);
        }
        info!("Job processor stopped");
    }

    fn reap(&self, finished: Result<JobResult, JoinError>) {
        if let Err(e) = finished {
            self.counters.failed.fetch_add(1, Ordering::SeqCst);
            error!(error = %e, "Job task aborted");
        }
        self.finished.notify_waiters();
    }

    async fn run_job(&self, queued: QueuedJob, shutdown: CancellationToken) -> JobResult {
        let QueuedJob {
            id,
            job,
            enqueued_at,
        } = queued;
        let started = Instant::now();
        let waited_ms = (Utc::now() - enqueued_at).num_milliseconds();
        debug!(job_id = %id, job = job.name(), waited_ms, "Job started");

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match job.run().await {
                Ok(()) => {
                    let result = JobResult::success(attempt, elapsed_ms(started));
                    self.counters.completed.fetch_add(1, Ordering::SeqCst);
                    info!(
                        job_id = %id,
                        job = job.name(),
                        attempts = attempt,
                        duration_ms = result.duration_ms,
                        "Job completed"
                    );
                    return result;
                }
                Err(e) => e,
            };

            if !err.is_retryable() || attempt > self.config.max_retries {
                let err = if err.is_retryable() && attempt > 1 {
                    ClientError::MaxRetriesExceeded {
                        attempts: attempt,
                        reason: err.to_string(),
                    }
                } else {
                    err
                };
                return self.fail(id, job.name(), &err, attempt, started);
            }

            let delay_ms = self
                .config
                .retry_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            self.counters.retried.fetch_add(1, Ordering::SeqCst);
            warn!(
                job_id = %id,
                job = job.name(),
                attempt,
                max_retries = self.config.max_retries,
                delay_ms,
                error = %err,
                "Job failed, retrying"
            );

            tokio::select! {
                _ = shutdown.cancelled() => {
                    let err = ClientError::Cancelled(format!("{} interrupted during retry", job.name()));
                    return self.fail(id, job.name(), &err, attempt, started);
                }
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
            }
        }
    }

    fn fail(
        &self,
        id: Uuid,
        name: &str,
        err: &ClientError,
        attempts: u32,
        started: Instant,
    ) -> JobResult {
        self.counters.failed.fetch_add(1, Ordering::SeqCst);
        debug!(job_id = %id, job = name, attempts, "Job failed");
        err.log();
        JobResult::from_error(err, attempts, elapsed_ms(started))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
