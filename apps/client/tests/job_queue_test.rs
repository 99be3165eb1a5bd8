//! Job queue integration tests
//!
//! Exercises the queue through its scoped provider:
//! - jobs run only while a provider is mounted
//! - concurrency is bounded by configuration
//! - shutdown waits for running jobs and keeps queued ones

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{authenticated_client, eventually};
use futures_util::future::BoxFuture;
use lumen_client::{
    ClientResult, Job, JobQueue, JobQueueConfig, JobQueueProvider, RefreshUserDirectory,
    UserDirectoryQuery,
};
use lumen_jellyfin_client::JellyfinClient;
use lumen_test_utils::{MockJellyfinServer, UserFixture};
use rstest::rstest;

/// Job sleeping for a while and tracking how many run at once
struct SlowJob {
    delay: Duration,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    done: Arc<AtomicUsize>,
}

impl Job for SlowJob {
    fn name(&self) -> &str {
        "slow"
    }

    fn run(&self) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[derive(Default)]
struct Tracker {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    done: Arc<AtomicUsize>,
}

impl Tracker {
    fn job(&self, delay: Duration) -> SlowJob {
        SlowJob {
            delay,
            running: Arc::clone(&self.running),
            peak: Arc::clone(&self.peak),
            done: Arc::clone(&self.done),
        }
    }

    fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }
}

fn config(max_concurrent_jobs: usize) -> JobQueueConfig {
    JobQueueConfig {
        max_concurrent_jobs,
        max_retries: 0,
        retry_delay_ms: 1,
    }
}

#[rstest]
#[case(1)]
#[case(3)]
#[tokio::test]
async fn test_concurrency_is_bounded(#[case] max_concurrent_jobs: usize) {
    let queue = JobQueue::new(config(max_concurrent_jobs));
    let tracker = Tracker::default();
    for _ in 0..6 {
        queue.enqueue(tracker.job(Duration::from_millis(30))).unwrap();
    }

    let provider = JobQueueProvider::mount(&queue);
    tokio::time::timeout(Duration::from_secs(5), queue.wait_until_idle())
        .await
        .unwrap();
    provider.unmount().await;

    assert_eq!(tracker.done(), 6);
    assert_eq!(tracker.peak.load(Ordering::SeqCst), max_concurrent_jobs);
    assert_eq!(queue.stats().completed, 6);
}

#[tokio::test]
async fn test_nothing_runs_without_provider() {
    let queue = JobQueue::new(config(1));
    let tracker = Tracker::default();
    queue.enqueue(tracker.job(Duration::ZERO)).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(tracker.done(), 0);

    let provider = JobQueueProvider::mount(&queue);
    eventually(|| tracker.done() == 1).await;
    provider.unmount().await;
}

#[tokio::test]
async fn test_unmount_waits_for_running_job_and_keeps_queue() {
    let queue = JobQueue::new(config(1));
    let tracker = Tracker::default();
    queue.enqueue(tracker.job(Duration::from_millis(100))).unwrap();
    queue.enqueue(tracker.job(Duration::from_millis(100))).unwrap();

    let provider = JobQueueProvider::mount(&queue);
    eventually(|| tracker.running.load(Ordering::SeqCst) == 1).await;
    provider.unmount().await;

    assert_eq!(tracker.done(), 1);
    assert_eq!(tracker.running.load(Ordering::SeqCst), 0);
    assert_eq!(queue.stats().pending(), 1);

    let provider = JobQueueProvider::mount(&queue);
    tokio::time::timeout(Duration::from_secs(5), queue.wait_until_idle())
        .await
        .unwrap();
    provider.unmount().await;
    assert_eq!(tracker.done(), 2);
}

#[tokio::test]
async fn test_dropping_provider_stops_processing() {
    let queue = JobQueue::new(config(1));
    let tracker = Tracker::default();

    let provider = JobQueueProvider::mount(&queue);
    assert!(provider.is_active());
    drop(provider);
    tokio::time::sleep(Duration::from_millis(20)).await;

    queue.enqueue(tracker.job(Duration::ZERO)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(tracker.done(), 0);
}

#[tokio::test]
async fn test_refresh_user_directory_job() {
    let server = MockJellyfinServer::start().await;
    server
        .mock_users_success(vec![
            UserFixture::new("u1", "alice"),
            UserFixture::new("u2", "bob"),
        ])
        .await;
    let client = authenticated_client(&server);
    let users = UserDirectoryQuery::new(Duration::from_secs(60));

    users.fetch_users(Some(&client)).await.unwrap();
    assert_eq!(server.user_list_requests().await, 1);

    let queue = JobQueue::new(config(1));
    let provider = JobQueueProvider::mount(&queue);
    queue
        .enqueue(RefreshUserDirectory::new(users.clone(), client.clone()))
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), queue.wait_until_idle())
        .await
        .unwrap();
    provider.unmount().await;

    assert_eq!(server.user_list_requests().await, 2);
    assert_eq!(users.cached().map(|u| u.len()), Some(2));
    assert_eq!(queue.stats().completed, 1);
}

#[tokio::test]
async fn test_failed_refresh_is_counted() {
    let server = MockJellyfinServer::start().await;
    server.mock_users_unauthorized().await;
    let client = authenticated_client(&server);

    let queue = JobQueue::new(JobQueueConfig {
        max_concurrent_jobs: 1,
        max_retries: 3,
        retry_delay_ms: 1,
    });
    let provider = JobQueueProvider::mount(&queue);
    queue
        .enqueue(RefreshUserDirectory::new(UserDirectoryQuery::default(), client))
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), queue.wait_until_idle())
        .await
        .unwrap();
    provider.unmount().await;

    let stats = queue.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.retried, 0);
    assert_eq!(server.user_list_requests().await, 1);
}

#[tokio::test]
async fn test_refresh_retries_only_through_queue() {
    let server = MockJellyfinServer::start().await;
    server.mock_users_server_error("upstream unavailable").await;
    let client = JellyfinClient::new(&server.authenticated_config())
        .unwrap()
        .with_retry_config(3, 1);

    let queue = JobQueue::new(JobQueueConfig {
        max_concurrent_jobs: 1,
        max_retries: 1,
        retry_delay_ms: 1,
    });
    let provider = JobQueueProvider::mount(&queue);
    queue
        .enqueue(RefreshUserDirectory::new(UserDirectoryQuery::default(), client))
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), queue.wait_until_idle())
        .await
        .unwrap();
    provider.unmount().await;

    let stats = queue.stats();
    assert_eq!(stats.retried, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(server.user_list_requests().await, 2);
}
