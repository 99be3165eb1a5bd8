//! User directory query
//!
//! Lists the user accounts known to the configured server through the query
//! cache. The API client is passed in explicitly: `None` (or a client without
//! a session) is the unauthenticated case and yields an empty list without
//! touching the network or the cache.

use std::future::Future;
use std::time::Duration;

use lumen_jellyfin_client::{JellyfinClient, UserAccount};
use tracing::{debug, instrument};

use crate::error::{ClientError, ClientResult};
use crate::query::{QueryCache, QueryState};

/// Cache key of the user directory
pub const USERS_QUERY_KEY: &str = "users";

/// Source of the server's user accounts
pub trait UserSource: Sync {
    /// Whether the source holds an authenticated session
    fn is_authenticated(&self) -> bool {
        true
    }

    /// Fetch every user account known to the server
    fn list_users(&self) -> impl Future<Output = ClientResult<Vec<UserAccount>>> + Send;
}

impl UserSource for JellyfinClient {
    fn is_authenticated(&self) -> bool {
        JellyfinClient::is_authenticated(self)
    }

    fn list_users(&self) -> impl Future<Output = ClientResult<Vec<UserAccount>>> + Send {
        async move { self.get_users().await.map_err(ClientError::from) }
    }
}

/// Cached user directory
#[derive(Debug, Clone, Default)]
pub struct UserDirectoryQuery {
    cache: QueryCache<Vec<UserAccount>>,
}

impl UserDirectoryQuery {
    /// Create a user directory whose result stays fresh for `stale_time`
    pub fn new(stale_time: Duration) -> Self {
        Self {
            cache: QueryCache::new(stale_time),
        }
    }

    /// Create a user directory on a shared cache
    pub fn with_cache(cache: QueryCache<Vec<UserAccount>>) -> Self {
        Self { cache }
    }

    /// Fetch the user accounts known to the server
    ///
    /// Without an authenticated client the result is an empty list and no
    /// request is made. Server failures are returned as errors and leave the
    /// query in the error state.
    #[instrument(skip_all)]
    pub async fn fetch_users<S: UserSource>(
        &self,
        client: Option<&S>,
    ) -> ClientResult<Vec<UserAccount>> {
        let Some(client) = client.filter(|c| c.is_authenticated()) else {
            debug!("No authenticated client, user directory is empty");
            return Ok(Vec::new());
        };

        let users = self
            .cache
            .fetch(USERS_QUERY_KEY, || client.list_users())
            .await?;

        debug!(user_count = users.len(), "User directory loaded");
        Ok(users)
    }

    /// Cached user list, if any, without fetching
    pub fn cached(&self) -> Option<Vec<UserAccount>> {
        self.cache.get(USERS_QUERY_KEY)
    }

    /// State of the last fetch, `Loading` while one is in flight
    pub fn state(&self) -> QueryState<Vec<UserAccount>> {
        self.cache.state(USERS_QUERY_KEY)
    }

    /// Drop the cached user list, e.g. after logout or switching servers
    pub fn invalidate(&self) {
        self.cache.invalidate(USERS_QUERY_KEY);
    }
}
