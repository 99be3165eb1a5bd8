//! Jellyfin server configuration types

use crate::{get_env_or_default, get_required_env, parse_env, ConfigError, ConfigResult};
use std::env;

/// Default client name reported to the server
const DEFAULT_CLIENT_NAME: &str = "Lumen";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Jellyfin media server connection configuration
#[derive(Clone)]
pub struct JellyfinConfig {
    /// Jellyfin server URL
    pub url: String,

    /// Access token of an authenticated session, if any
    pub access_token: Option<String>,

    /// Client application name sent in the authorization header
    pub client_name: String,

    /// Human readable device name
    pub device_name: String,

    /// Stable device identifier
    pub device_id: String,

    /// Client version sent in the authorization header
    pub client_version: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for JellyfinConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JellyfinConfig")
            .field("url", &self.url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("client_name", &self.client_name)
            .field("device_name", &self.device_name)
            .field("device_id", &self.device_id)
            .field("client_version", &self.client_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl JellyfinConfig {
    /// Load Jellyfin configuration from environment variables
    ///
    /// `JELLYFIN_URL` is required and must be an absolute http(s) URL.
    /// A missing or empty `JELLYFIN_ACCESS_TOKEN` leaves the configuration
    /// unauthenticated.
    pub fn from_env() -> ConfigResult<Self> {
        let url = get_required_env("JELLYFIN_URL")?;
        validate_server_url("JELLYFIN_URL", &url)?;

        let timeout_secs = parse_env("JELLYFIN_TIMEOUT", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "JELLYFIN_TIMEOUT must be at least one second".to_string(),
            ));
        }

        let access_token = env::var("JELLYFIN_ACCESS_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            url,
            access_token,
            client_name: get_env_or_default("JELLYFIN_CLIENT_NAME", DEFAULT_CLIENT_NAME),
            device_name: get_env_or_default("JELLYFIN_DEVICE_NAME", DEFAULT_CLIENT_NAME),
            device_id: env::var("JELLYFIN_DEVICE_ID")
                .ok()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout_secs,
        })
    }

    /// Create a configuration for a server URL (useful for testing)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            device_name: DEFAULT_CLIENT_NAME.to_string(),
            device_id: "lumen-test-device".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Whether an access token is configured
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Get the full URL for an API path
    pub fn api_url(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Build the `Authorization` header value for Jellyfin requests
    ///
    /// The token is passed explicitly so a client that authenticated at
    /// runtime can reuse the static device fields.
    pub fn authorization_header(&self, token: Option<&str>) -> String {
        let mut header = format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            self.client_name, self.device_name, self.device_id, self.client_version
        );
        if let Some(token) = token {
            header.push_str(&format!(", Token=\"{}\"", token));
        }
        header
    }
}

/// Check that a server URL is absolute and uses http or https
fn validate_server_url(name: &str, value: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(
            name.to_string(),
            format!("unsupported scheme '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = JellyfinConfig::new("http://jellyfin:8096");
        assert_eq!(config.url, "http://jellyfin:8096");
        assert!(config.access_token.is_none());
        assert!(!config.is_authenticated());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_api_url() {
        let config = JellyfinConfig::new("http://jellyfin:8096");
        assert_eq!(config.api_url("Users"), "http://jellyfin:8096/Users");
        assert_eq!(
            config.api_url("/Users/Public"),
            "http://jellyfin:8096/Users/Public"
        );
    }

    #[test]
    fn test_api_url_with_trailing_slash_and_base_path() {
        let config = JellyfinConfig::new("https://media.example.com/jellyfin/");
        assert_eq!(
            config.api_url("Users"),
            "https://media.example.com/jellyfin/Users"
        );
    }

    #[test]
    fn test_authorization_header_without_token() {
        let config = JellyfinConfig::new("http://jellyfin:8096");
        let header = config.authorization_header(None);
        assert!(header.starts_with("MediaBrowser Client=\"Lumen\""));
        assert!(header.contains("DeviceId=\"lumen-test-device\""));
        assert!(!header.contains("Token="));
    }

    #[test]
    fn test_authorization_header_with_token() {
        let config = JellyfinConfig::new("http://jellyfin:8096");
        let header = config.authorization_header(Some("abc123"));
        assert!(header.ends_with(", Token=\"abc123\""));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = JellyfinConfig::new("http://jellyfin:8096").with_access_token("secret");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_env_requires_url() {
        temp_env::with_var_unset("JELLYFIN_URL", || {
            let result = JellyfinConfig::from_env();
            assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "JELLYFIN_URL"));
        });
    }

    #[test]
    fn test_from_env_rejects_invalid_url() {
        temp_env::with_var("JELLYFIN_URL", Some("not a url"), || {
            let result = JellyfinConfig::from_env();
            assert!(matches!(result, Err(ConfigError::InvalidUrl(_, _))));
        });
    }

    #[test]
    fn test_from_env_rejects_non_http_scheme() {
        temp_env::with_var("JELLYFIN_URL", Some("ftp://jellyfin:8096"), || {
            let result = JellyfinConfig::from_env();
            assert!(matches!(result, Err(ConfigError::InvalidUrl(_, _))));
        });
    }

    #[test]
    fn test_from_env_empty_token_is_unauthenticated() {
        temp_env::with_vars(
            [
                ("JELLYFIN_URL", Some("http://jellyfin:8096")),
                ("JELLYFIN_ACCESS_TOKEN", Some("  ")),
                ("JELLYFIN_TIMEOUT", None),
            ],
            || {
                let config = JellyfinConfig::from_env().unwrap();
                assert!(!config.is_authenticated());
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_from_env_full() {
        temp_env::with_vars(
            [
                ("JELLYFIN_URL", Some("https://media.example.com")),
                ("JELLYFIN_ACCESS_TOKEN", Some("token-1")),
                ("JELLYFIN_DEVICE_ID", Some("device-42")),
                ("JELLYFIN_DEVICE_NAME", Some("Living Room TV")),
                ("JELLYFIN_TIMEOUT", Some("10")),
            ],
            || {
                let config = JellyfinConfig::from_env().unwrap();
                assert_eq!(config.access_token.as_deref(), Some("token-1"));
                assert_eq!(config.device_id, "device-42");
                assert_eq!(config.device_name, "Living Room TV");
                assert_eq!(config.timeout_secs, 10);
            },
        );
    }

    #[test]
    fn test_from_env_generates_device_id() {
        temp_env::with_vars(
            [
                ("JELLYFIN_URL", Some("http://jellyfin:8096")),
                ("JELLYFIN_DEVICE_ID", None),
            ],
            || {
                let config = JellyfinConfig::from_env().unwrap();
                assert!(uuid::Uuid::parse_str(&config.device_id).is_ok());
            },
        );
    }

    #[test]
    fn test_from_env_invalid_timeout() {
        temp_env::with_vars(
            [
                ("JELLYFIN_URL", Some("http://jellyfin:8096")),
                ("JELLYFIN_TIMEOUT", Some("soon")),
            ],
            || {
                let result = JellyfinConfig::from_env();
                assert!(matches!(result, Err(ConfigError::InvalidValue(_, _))));
            },
        );
    }

    #[test]
    fn test_from_env_zero_timeout() {
        temp_env::with_vars(
            [
                ("JELLYFIN_URL", Some("http://jellyfin:8096")),
                ("JELLYFIN_TIMEOUT", Some("0")),
            ],
            || {
                let result = JellyfinConfig::from_env();
                assert!(matches!(result, Err(ConfigError::ValidationError(_))));
            },
        );
    }
}
