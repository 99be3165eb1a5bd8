//! Jellyfin API error types

use thiserror::Error;

/// Jellyfin API client errors
#[derive(Error, Debug)]
pub enum JellyfinError {
    /// Endpoint requires an authenticated session
    #[error("an access token is required for this Jellyfin endpoint")]
    MissingAccessToken,

    /// Client configuration could not be loaded
    #[error("Invalid Jellyfin configuration: {0}")]
    Configuration(#[from] lumen_shared_config::ConfigError),

    /// Invalid input provided to API method
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse Jellyfin response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server rejected the credentials or token
    #[error("Jellyfin rejected the request credentials")]
    Unauthorized,

    /// Jellyfin returned a non-success status
    #[error("Jellyfin API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the server or a proxy in front of it
    #[error("Rate limited by Jellyfin server")]
    RateLimited,

    /// Request timeout
    #[error("Request to Jellyfin timed out")]
    Timeout,
}

impl JellyfinError {
    /// Check if this error is retryable (transient failure)
    ///
    /// Retries on:
    /// - Timeouts
    /// - Rate limiting
    /// - Transport errors (connect, timeout)
    /// - Server errors (5xx)
    ///
    /// Does NOT retry on client errors (4xx except 429 rate limiting).
    pub fn is_retryable(&self) -> bool {
        match self {
            JellyfinError::Timeout | JellyfinError::RateLimited => true,
            JellyfinError::Api { status, .. } => *status >= 500,
            JellyfinError::Http(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(e.status(), Some(status) if status.is_server_error())
            }
            _ => false,
        }
    }
}

/// Result type for Jellyfin operations
pub type JellyfinResult<T> = Result<T, JellyfinError>;
