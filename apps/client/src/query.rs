//! Read-through query cache
//!
//! Results are memoized per key for a freshness window. At most one fetch
//! per key is in flight: concurrent callers wait for it and then read the
//! freshly cached value. Reads of the cached value and query state never wait
//! on a fetch. Failures are recorded in the query state but never cached.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default freshness window for cached results
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(300);

/// Observable state of a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// Never fetched, or invalidated
    Idle,
    /// A fetch is in flight
    Loading,
    /// Last fetch succeeded
    Success(T),
    /// Last fetch failed
    Error(String),
}

#[derive(Debug, Clone)]
struct CachedValue<T> {
    value: T,
    fetched_at: Instant,
}

#[derive(Debug)]
struct Entry<T> {
    cached: Option<CachedValue<T>>,
    last_error: Option<String>,
    loading: bool,
    /// Bumped on invalidation so an in-flight fetch does not repopulate
    generation: u64,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            cached: None,
            last_error: None,
            loading: false,
            generation: 0,
        }
    }
}

/// Clears the loading flag even if the fetch future is dropped
struct LoadingGuard<'a, T> {
    entries: &'a DashMap<String, Entry<T>>,
    key: &'a str,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(mut entry) = self.entries.get_mut(self.key) {
            entry.loading = false;
        }
    }
}

/// Keyed read-through cache with per-key request deduplication
///
/// Clones share the same entries.
#[derive(Debug)]
pub struct QueryCache<T> {
    entries: Arc<DashMap<String, Entry<T>>>,
    in_flight: Arc<DashMap<String, Arc<Mutex<()>>>>,
    stale_time: Duration,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            in_flight: Arc::clone(&self.in_flight),
            stale_time: self.stale_time,
        }
    }
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl<T> QueryCache<T> {
    /// Create a cache whose entries stay fresh for `stale_time`
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            stale_time,
        }
    }

    /// Freshness window of this cache
    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    fn fetch_lock(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.in_flight.entry(key.to_string()).or_default().value())
    }

    /// Discard the entry for `key`
    ///
    /// A fetch already in flight still answers its callers, but its result is
    /// not cached.
    pub fn invalidate(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.cached = None;
            entry.last_error = None;
            entry.generation += 1;
            debug!(key, "Query invalidated");
        }
    }

    /// Discard every entry
    pub fn clear(&self) {
        for mut entry in self.entries.iter_mut() {
            entry.cached = None;
            entry.last_error = None;
            entry.generation += 1;
        }
    }
}

impl<T: Clone> QueryCache<T> {
    fn fresh(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        entry
            .cached
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.stale_time)
            .map(|cached| cached.value.clone())
    }

    /// Return the cached value for `key` or fetch it
    ///
    /// A cached value younger than the freshness window is returned without
    /// calling `fetcher`. Otherwise `fetcher` runs unless another caller is
    /// already fetching the key, in which case this call waits for that fetch
    /// and returns its cached result. A success replaces the cached value, a
    /// failure is recorded in the query state and returned to the caller.
    pub async fn fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if let Some(value) = self.fresh(key) {
            debug!(key, "Query cache hit");
            return Ok(value);
        }

        let lock = self.fetch_lock(key);
        let _in_flight = lock.lock().await;

        if let Some(value) = self.fresh(key) {
            debug!(key, "Query filled by concurrent fetch");
            return Ok(value);
        }

        let generation = {
            let mut entry = self.entries.entry(key.to_string()).or_default();
            entry.loading = true;
            entry.generation
        };
        let _loading = LoadingGuard {
            entries: &self.entries,
            key,
        };

        debug!(key, "Query cache miss, fetching");
        let result = fetcher().await;

        let mut entry = self.entries.entry(key.to_string()).or_default();
        entry.loading = false;
        if entry.generation != generation {
            debug!(key, "Query invalidated during fetch, result not cached");
            return result;
        }
        match &result {
            Ok(value) => {
                entry.cached = Some(CachedValue {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                entry.last_error = None;
            }
            Err(e) => {
                warn!(key, error = %e, "Query fetch failed");
                entry.last_error = Some(e.to_string());
            }
        }
        drop(entry);
        result
    }

    /// Cached value for `key`, fresh or stale, without fetching
    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        entry.cached.as_ref().map(|cached| cached.value.clone())
    }

    /// Outcome of the last fetch for `key`, or `Loading` while one is in flight
    pub fn state(&self, key: &str) -> QueryState<T> {
        let Some(entry) = self.entries.get(key) else {
            return QueryState::Idle;
        };
        if entry.loading {
            return QueryState::Loading;
        }
        match (&entry.last_error, &entry.cached) {
            (Some(error), _) => QueryState::Error(error.clone()),
            (None, Some(cached)) => QueryState::Success(cached.value.clone()),
            (None, None) => QueryState::Idle,
        }
    }
}
