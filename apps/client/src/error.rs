//! Error handling for the Lumen client
//!
//! This module provides a unified error type for the query cache, the user
//! directory and background job processing, using thiserror.

use lumen_jellyfin_client::JellyfinError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main client error type
#[derive(Error, Debug)]
pub enum ClientError {
    // ========== Server Errors ==========
    /// Server rejected the session
    #[error("not authorized by the media server")]
    Unauthorized,

    /// Server call timed out
    #[error("external service timeout: {service}")]
    ServiceTimeout { service: String },

    /// Any other failure reported by the Jellyfin client
    #[error("media server error: {0}")]
    Jellyfin(#[source] JellyfinError),

    // ========== Job Processing Errors ==========
    /// Job failed with a message from the job itself
    #[error("job '{job}' failed: {reason}")]
    JobFailed { job: String, reason: String },

    /// Job execution was cancelled (e.g., due to shutdown)
    #[error("job cancelled: {0}")]
    Cancelled(String),

    /// Job timed out during execution
    #[error("job timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Job failed after maximum retry attempts
    #[error("job failed after {attempts} attempts: {reason}")]
    MaxRetriesExceeded { attempts: u32, reason: String },

    /// Queue no longer accepts jobs
    #[error("job queue closed")]
    QueueClosed,

    // ========== Configuration Errors ==========
    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Missing required configuration
    #[error("missing required configuration: {0}")]
    MissingConfiguration(&'static str),

    // ========== Internal Errors ==========
    /// Internal client error (catch-all for unexpected errors)
    #[error("internal client error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ServiceTimeout { .. } | Self::Timeout { .. } => true,
            Self::Jellyfin(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get a severity level for logging
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Configuration(_)
            | Self::MissingConfiguration(_)
            | Self::MaxRetriesExceeded { .. } => ErrorSeverity::Critical,

            Self::Jellyfin(_) | Self::JobFailed { .. } | Self::Internal(_) => ErrorSeverity::Error,

            Self::Unauthorized
            | Self::Timeout { .. }
            | Self::ServiceTimeout { .. }
            | Self::QueueClosed => ErrorSeverity::Warning,

            Self::Cancelled(_) => ErrorSeverity::Info,
        }
    }

    /// Get the component this error is related to, if applicable
    pub fn component(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized | Self::ServiceTimeout { .. } | Self::Jellyfin(_) => {
                Some("jellyfin")
            }
            Self::JobFailed { .. }
            | Self::Cancelled(_)
            | Self::Timeout { .. }
            | Self::MaxRetriesExceeded { .. }
            | Self::QueueClosed => Some("job_queue"),
            _ => None,
        }
    }

    /// Log the error with appropriate severity
    pub fn log(&self) {
        let context = self.component().unwrap_or("general");
        match self.severity() {
            ErrorSeverity::Critical => {
                tracing::error!(
                    error = %self,
                    context = context,
                    retryable = self.is_retryable(),
                    "Critical client error"
                );
            }
            ErrorSeverity::Error => {
                tracing::error!(
                    error = %self,
                    context = context,
                    retryable = self.is_retryable(),
                    "Client error"
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error = %self,
                    context = context,
                    retryable = self.is_retryable(),
                    "Client warning"
                );
            }
            ErrorSeverity::Info => {
                tracing::info!(
                    error = %self,
                    context = context,
                    retryable = self.is_retryable(),
                    "Client info"
                );
            }
        }
    }

    /// Create a job failure
    pub fn job_failed(job: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::JobFailed {
            job: job.into(),
            reason: reason.into(),
        }
    }
}

/// Error severity levels for logging and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical errors that should trigger alerts
    Critical,
    /// Standard errors
    Error,
    /// Warnings for expected failures
    Warning,
    /// Informational messages
    Info,
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Job execution result with metadata for retry handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Whether the job succeeded
    pub success: bool,
    /// Error message if failed
    pub error_message: Option<String>,
    /// Whether the last failure was retryable
    pub retryable: bool,
    /// Number of attempts made
    pub attempts: u32,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl JobResult {
    /// Create a successful job result
    pub fn success(attempts: u32, duration_ms: u64) -> Self {
        Self {
            success: true,
            error_message: None,
            retryable: false,
            attempts,
            duration_ms,
        }
    }

    /// Create a failed job result from an error
    pub fn from_error(err: &ClientError, attempts: u32, duration_ms: u64) -> Self {
        Self {
            success: false,
            error_message: Some(err.to_string()),
            retryable: err.is_retryable(),
            attempts,
            duration_ms,
        }
    }
}

// ========== Conversion Implementations ==========

impl From<JellyfinError> for ClientError {
    fn from(err: JellyfinError) -> Self {
        match err {
            JellyfinError::Unauthorized | JellyfinError::MissingAccessToken => Self::Unauthorized,
            JellyfinError::Timeout => Self::ServiceTimeout {
                service: "Jellyfin".to_string(),
            },
            JellyfinError::Configuration(e) => Self::Configuration(e.to_string()),
            other => Self::Jellyfin(other),
        }
    }
}

impl From<lumen_shared_config::ConfigError> for ClientError {
    fn from(err: lumen_shared_config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ClientError>() {
            Ok(client_err) => client_err,
            Err(err) => Self::Internal(err.to_string()),
        }
    }
}
