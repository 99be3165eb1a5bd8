//! Jellyfin API client implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use lumen_shared_config::JellyfinConfig;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::{JellyfinError, JellyfinResult};
use crate::models::{AuthenticateByNameRequest, AuthenticationResult, UserAccount};

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default number of retry attempts for transient failures
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Maximum error body size kept in error messages
const MAX_ERROR_BODY_SIZE: usize = 512;

/// Maximum username length accepted by the server
const MAX_USERNAME_LENGTH: usize = 256;

/// Jellyfin API client
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Clone)]
pub struct JellyfinClient {
    http_client: Client,
    config: JellyfinConfig,
    access_token: Option<String>,
    max_retries: u32,
    retry_base_delay_ms: u64,
}

impl fmt::Debug for JellyfinClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JellyfinClient")
            .field("url", &self.config.url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl JellyfinClient {
    /// Create a new Jellyfin client from configuration
    ///
    /// The access token from the configuration, if any, is used for
    /// authenticated endpoints.
    pub fn new(config: &JellyfinConfig) -> JellyfinResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(format!("{}/{}", config.client_name, config.client_version))
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
            access_token: config.access_token.clone(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
        })
    }

    /// Create a Jellyfin client from environment variables
    ///
    /// See [`JellyfinConfig::from_env`] for the variables read.
    pub fn from_env() -> JellyfinResult<Self> {
        Self::new(&JellyfinConfig::from_env()?)
    }

    /// Return a client that authenticates with the given access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, max_retries: u32, base_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay_ms = base_delay_ms;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &JellyfinConfig {
        &self.config
    }

    /// Whether this client carries an access token
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Execute an operation with retry logic for transient failures
    async fn with_retry<T, F, Fut>(&self, operation: F) -> JellyfinResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = JellyfinResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay_ms = backoff_delay_ms(self.retry_base_delay_ms, attempt);
                    warn!(
                        attempt = attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Jellyfin request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Build a request with the Jellyfin authorization header
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, self.config.api_url(path))
            .header(
                reqwest::header::AUTHORIZATION,
                self.config
                    .authorization_header(self.access_token.as_deref()),
            )
    }

    /// Send a request and return the body of a successful response
    async fn send(&self, request: RequestBuilder) -> JellyfinResult<String> {
        let response = request.send().await.map_err(map_transport_error)?;
        let response = check_status(response).await?;
        response.text().await.map_err(map_transport_error)
    }

    /// Get all users known to the server
    ///
    /// Requires an access token. An empty or `null` response body is treated
    /// as an empty list.
    ///
    /// # Errors
    /// - `JellyfinError::MissingAccessToken` - If the client is not authenticated
    /// - `JellyfinError::Unauthorized` - If the server rejects the token
    /// - `JellyfinError::Api` - If the server returns another error status
    /// - `JellyfinError::Http` - If the HTTP request fails
    #[instrument(skip(self))]
    pub async fn get_users(&self) -> JellyfinResult<Vec<UserAccount>> {
        if !self.is_authenticated() {
            return Err(JellyfinError::MissingAccessToken);
        }

        debug!("Fetching users from Jellyfin");

        let text = self
            .with_retry(|| async { self.send(self.request(Method::GET, "Users")).await })
            .await?;

        let users = parse_user_list(&text)?;
        debug!(user_count = users.len(), "Fetched users");
        Ok(users)
    }

    /// Get the users the server exposes on its login screen
    ///
    /// Does not require an access token.
    #[instrument(skip(self))]
    pub async fn get_public_users(&self) -> JellyfinResult<Vec<UserAccount>> {
        debug!("Fetching public users from Jellyfin");

        let text = self
            .with_retry(|| async {
                self.send(self.request(Method::GET, "Users/Public")).await
            })
            .await?;

        parse_user_list(&text)
    }

    /// Authenticate with a username and password
    ///
    /// Returns the server's authentication result. Use
    /// [`JellyfinClient::with_access_token`] with `access_token` to obtain an
    /// authenticated client. The request is not retried.
    ///
    /// # Errors
    /// - `JellyfinError::InvalidInput` - If the username is empty or too long
    /// - `JellyfinError::Unauthorized` - If the credentials are rejected
    #[instrument(skip(self, password))]
    pub async fn authenticate_by_name(
        &self,
        username: &str,
        password: &str,
    ) -> JellyfinResult<AuthenticationResult> {
        let username = validate_username(username)?;

        let request = self
            .request(Method::POST, "Users/AuthenticateByName")
            .json(&AuthenticateByNameRequest {
                username,
                pw: password,
            });

        let text = self.send(request).await?;
        let result: AuthenticationResult = serde_json::from_str(&text)?;

        debug!(
            user_id = result.user.as_ref().map(|u| u.id.as_str()),
            "Authenticated with Jellyfin"
        );

        Ok(result)
    }
}

/// Delay before the given retry attempt, saturating instead of overflowing
fn backoff_delay_ms(base_delay_ms: u64, attempt: u32) -> u64 {
    base_delay_ms.saturating_mul(2u64.saturating_pow(attempt))
}

/// Validate username input
fn validate_username(username: &str) -> JellyfinResult<&str> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(JellyfinError::InvalidInput(
            "username cannot be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(JellyfinError::InvalidInput(format!(
            "username too long (max {} characters)",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Parse a user list body, mapping an empty or `null` payload to no users
fn parse_user_list(text: &str) -> JellyfinResult<Vec<UserAccount>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let users: Option<Vec<UserAccount>> = serde_json::from_str(text)?;
    Ok(users.unwrap_or_default())
}

fn map_transport_error(e: reqwest::Error) -> JellyfinError {
    if e.is_timeout() {
        JellyfinError::Timeout
    } else {
        JellyfinError::Http(e)
    }
}

/// Map non-success statuses to API errors
async fn check_status(response: Response) -> JellyfinResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(JellyfinError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("Jellyfin API rate limited");
            Err(JellyfinError::RateLimited)
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(JellyfinError::Api {
                status: status.as_u16(),
                message: truncate_error_body(body),
            })
        }
    }
}

/// Truncate an error body on a UTF-8 boundary
fn truncate_error_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY_SIZE {
        return body;
    }
    let truncate_at = body
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= MAX_ERROR_BODY_SIZE)
        .last()
        .unwrap_or(0);
    format!("{}... (truncated)", &body[..truncate_at])
}
