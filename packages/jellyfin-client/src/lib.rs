//! Jellyfin API client for Lumen
//!
//! This crate provides a client for the Jellyfin REST API, covering:
//! - User directory listing
//! - Public (login screen) user listing
//! - Username/password authentication
//!
//! # Example
//!
//! ```rust,no_run
//! use lumen_jellyfin_client::JellyfinClient;
//! use lumen_shared_config::JellyfinConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = JellyfinConfig::new("http://localhost:8096");
//! let client = JellyfinClient::new(&config)?;
//!
//! // Log in and switch to an authenticated client
//! let auth = client.authenticate_by_name("alice", "secret").await?;
//! let client = client.with_access_token(auth.access_token);
//!
//! for user in client.get_users().await? {
//!     println!("{} ({})", user.name, user.id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! - `JELLYFIN_URL`: server URL (required)
//! - `JELLYFIN_ACCESS_TOKEN`: access token of an existing session (optional)

mod client;
mod error;
mod models;

pub use client::JellyfinClient;
pub use error::{JellyfinError, JellyfinResult};
pub use models::{AuthenticationResult, UserAccount, UserPolicy};
