//! Shared test utilities for the Lumen workspace
//!
//! This crate provides mock implementations of external services for testing
//! without network dependencies.
//!
//! # Mock Services
//!
//! - [`MockJellyfinServer`] - Mock Jellyfin server for user directory and login tests
//!
//! # Example
//!
//! ```rust,ignore
//! use lumen_test_utils::{MockJellyfinServer, UserFixture};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let jellyfin = MockJellyfinServer::start().await;
//!     jellyfin.mock_users_success(vec![UserFixture::new("u1", "alice")]).await;
//!
//!     // Use jellyfin.authenticated_config() to configure your client
//! }
//! ```

mod jellyfin;

pub use jellyfin::{authorization_matcher, MockJellyfinServer, UserFixture};
