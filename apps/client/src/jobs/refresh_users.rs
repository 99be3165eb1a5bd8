//! Reload the cached user directory in the background

use futures_util::future::BoxFuture;
use lumen_jellyfin_client::JellyfinClient;
use tracing::info;

use super::Job;
use crate::error::ClientResult;
use crate::users::UserDirectoryQuery;

/// Drops the cached user list and fetches it again
///
/// Retries belong to the job queue: the client is used with its own retries
/// turned off so one failing attempt makes one request.
#[derive(Debug, Clone)]
pub struct RefreshUserDirectory {
    query: UserDirectoryQuery,
    client: JellyfinClient,
}

impl RefreshUserDirectory {
    pub fn new(query: UserDirectoryQuery, client: JellyfinClient) -> Self {
        Self {
            query,
            client: client.with_retry_config(0, 0),
        }
    }
}

impl Job for RefreshUserDirectory {
    fn name(&self) -> &str {
        "refresh_user_directory"
    }

    fn run(&self) -> BoxFuture<'_, ClientResult<()>> {
        Box::pin(async move {
            self.query.invalidate();
            let users = self.query.fetch_users(Some(&self.client)).await?;
            info!(user_count = users.len(), "User directory refreshed");
            Ok(())
        })
    }
}
