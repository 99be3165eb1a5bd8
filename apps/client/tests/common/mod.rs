//! Common test utilities for client integration tests

#![allow(dead_code)]

use std::time::Duration;

use lumen_jellyfin_client::JellyfinClient;
use lumen_test_utils::MockJellyfinServer;

/// Authenticated client against the mock server, with retries disabled
pub fn authenticated_client(server: &MockJellyfinServer) -> JellyfinClient {
    JellyfinClient::new(&server.authenticated_config())
        .unwrap()
        .with_retry_config(0, 0)
}

/// Client against the mock server without an access token
pub fn anonymous_client(server: &MockJellyfinServer) -> JellyfinClient {
    JellyfinClient::new(&server.config()).unwrap()
}

/// Poll `condition` until it holds or the timeout elapses
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
