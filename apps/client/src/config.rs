//! Client configuration loaded from environment variables
//!
//! Configuration is loaded from environment variables with defaults suited
//! to a single interactive client.

use std::time::Duration;

use anyhow::{Context, Result};
use lumen_shared_config::{parse_env, CommonConfig, Environment, JellyfinConfig};

use crate::jobs::JobQueueConfig;

/// Default freshness window of cached queries in seconds
const DEFAULT_QUERY_STALE_TIME_SECS: u64 = 300;

/// Shortest period between background user directory refreshes
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with the library crates
    pub common: CommonConfig,

    /// How long a cached query result stays fresh, in seconds
    pub query_stale_time_secs: u64,

    /// Background job queue settings
    pub job_queue: JobQueueConfig,

    /// Upper bound requested for streamed media, in bits per second
    pub max_streaming_bitrate: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env().context("Failed to load common config")?;

        Ok(Self {
            common,
            query_stale_time_secs: parse_env("QUERY_STALE_TIME", DEFAULT_QUERY_STALE_TIME_SECS)
                .context("Invalid QUERY_STALE_TIME value")?,
            job_queue: JobQueueConfig {
                max_concurrent_jobs: parse_env("JOB_QUEUE_MAX_CONCURRENT_JOBS", 1usize)
                    .context("Invalid JOB_QUEUE_MAX_CONCURRENT_JOBS value")?
                    .max(1),
                max_retries: parse_env("JOB_QUEUE_MAX_RETRIES", 3u32)
                    .context("Invalid JOB_QUEUE_MAX_RETRIES value")?,
                retry_delay_ms: parse_env("JOB_QUEUE_RETRY_DELAY_MS", 1000u64)
                    .context("Invalid JOB_QUEUE_RETRY_DELAY_MS value")?,
            },
            max_streaming_bitrate: std::env::var("STREAMING_MAX_BITRATE")
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("Invalid STREAMING_MAX_BITRATE value")?,
        })
    }

    /// Build a configuration around a Jellyfin server config with defaults elsewhere
    pub fn with_jellyfin(jellyfin: JellyfinConfig) -> Self {
        Self {
            common: CommonConfig {
                jellyfin,
                environment: Environment::default(),
                log_level: "info".to_string(),
            },
            query_stale_time_secs: DEFAULT_QUERY_STALE_TIME_SECS,
            job_queue: JobQueueConfig::default(),
            max_streaming_bitrate: None,
        }
    }

    /// Get the Jellyfin configuration
    pub fn jellyfin(&self) -> &JellyfinConfig {
        &self.common.jellyfin
    }

    /// Get the query freshness window
    pub fn query_stale_time(&self) -> Duration {
        Duration::from_secs(self.query_stale_time_secs)
    }

    /// Period of the background user directory refresh
    ///
    /// The first refresh is due one period after startup, once the initial
    /// fetch has gone stale.
    pub fn refresh_interval(&self) -> Duration {
        self.query_stale_time().max(MIN_REFRESH_INTERVAL)
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_URL: (&str, Option<&str>) = ("JELLYFIN_URL", Some("http://jellyfin:8096"));

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                SERVER_URL,
                ("QUERY_STALE_TIME", None),
                ("JOB_QUEUE_MAX_CONCURRENT_JOBS", None),
                ("JOB_QUEUE_MAX_RETRIES", None),
                ("JOB_QUEUE_RETRY_DELAY_MS", None),
                ("STREAMING_MAX_BITRATE", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.max_streaming_bitrate, None);
                assert_eq!(config.query_stale_time(), Duration::from_secs(300));
                assert_eq!(config.job_queue.max_concurrent_jobs, 1);
                assert_eq!(config.job_queue.max_retries, 3);
                assert_eq!(config.job_queue.retry_delay_ms, 1000);
            },
        );
    }

    #[test]
    fn test_custom_values() {
        temp_env::with_vars(
            [
                SERVER_URL,
                ("QUERY_STALE_TIME", Some("60")),
                ("JOB_QUEUE_MAX_CONCURRENT_JOBS", Some("4")),
                ("JOB_QUEUE_MAX_RETRIES", Some("0")),
                ("JOB_QUEUE_RETRY_DELAY_MS", Some("250")),
                ("STREAMING_MAX_BITRATE", Some("20000000")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.max_streaming_bitrate, Some(20_000_000));
                assert_eq!(config.query_stale_time_secs, 60);
                assert_eq!(config.job_queue.max_concurrent_jobs, 4);
                assert_eq!(config.job_queue.max_retries, 0);
                assert_eq!(config.job_queue.retry_delay_ms, 250);
            },
        );
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        temp_env::with_vars(
            [SERVER_URL, ("JOB_QUEUE_MAX_CONCURRENT_JOBS", Some("0"))],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.job_queue.max_concurrent_jobs, 1);
            },
        );
    }

    #[test]
    fn test_invalid_stale_time() {
        temp_env::with_vars([SERVER_URL, ("QUERY_STALE_TIME", Some("-5"))], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_missing_server_url() {
        temp_env::with_var_unset("JELLYFIN_URL", || {
            let err = Config::from_env().unwrap_err();
            assert!(format!("{:#}", err).contains("JELLYFIN_URL"));
        });
    }

    #[test]
    fn test_refresh_interval_follows_stale_time() {
        let mut config = Config::with_jellyfin(JellyfinConfig::new("http://localhost:8096"));
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));

        config.query_stale_time_secs = 0;
        assert_eq!(config.refresh_interval(), MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn test_with_jellyfin() {
        let config = Config::with_jellyfin(JellyfinConfig::new("http://localhost:8096"));
        assert_eq!(config.jellyfin().url, "http://localhost:8096");
        assert!(!config.is_production());
        assert_eq!(config.environment(), Environment::Development);
    }
}
