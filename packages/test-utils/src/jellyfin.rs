//! Mock Jellyfin server for testing user directory queries
//!
//! Provides a [`MockJellyfinServer`] that simulates the Jellyfin user
//! endpoints without a real server.

use std::time::Duration;

use lumen_shared_config::JellyfinConfig;
use serde_json::json;
use wiremock::matchers::{headers, method, path, HeaderExactMatcher};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock Jellyfin server for testing the client and user directory
///
/// Wraps a [`wiremock::MockServer`] and provides convenience methods for the
/// `/Users` family of endpoints. Authenticated mocks only match requests
/// carrying the authorization header produced by [`MockJellyfinServer::config`].
///
/// # Example
///
/// ```rust,ignore
/// use lumen_test_utils::{MockJellyfinServer, UserFixture};
///
/// #[tokio::test]
/// async fn test_users() {
///     let server = MockJellyfinServer::start().await;
///     server.mock_users_success(vec![UserFixture::new("u1", "alice")]).await;
///
///     let client = JellyfinClient::new(&server.config()).unwrap();
/// }
/// ```
pub struct MockJellyfinServer {
    server: MockServer,
    access_token: String,
}

impl MockJellyfinServer {
    /// Start a new mock Jellyfin server with the default access token
    pub async fn start() -> Self {
        Self::start_with_token("test-access-token").await
    }

    /// Start a new mock Jellyfin server accepting a custom access token
    pub async fn start_with_token(access_token: &str) -> Self {
        let server = MockServer::start().await;
        Self {
            server,
            access_token: access_token.to_string(),
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Get the access token the server accepts
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Unauthenticated client configuration pointing at this server
    pub fn config(&self) -> JellyfinConfig {
        JellyfinConfig::new(self.url())
    }

    /// Authenticated client configuration pointing at this server
    pub fn authenticated_config(&self) -> JellyfinConfig {
        self.config().with_access_token(self.access_token.clone())
    }

    fn authorized(&self) -> String {
        self.config().authorization_header(Some(&self.access_token))
    }

    /// Number of requests received on `GET /Users`
    pub async fn user_list_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.to_string() == "GET" && r.url.path() == "/Users")
            .count()
    }

    /// Mount a mock for a successful user list
    pub async fn mock_users_success(&self, users: Vec<UserFixture>) {
        self.mock_users_response(ResponseTemplate::new(200).set_body_json(users_json(users)))
            .await;
    }

    /// Mount a mock for a successful user list that must be hit exactly `calls` times
    pub async fn mock_users_expect(&self, users: Vec<UserFixture>, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/Users"))
            .and(authorization_matcher(&self.authorized()))
            .respond_with(ResponseTemplate::new(200).set_body_json(users_json(users)))
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a user list answered after a delay
    pub async fn mock_users_delayed(&self, users: Vec<UserFixture>, delay: Duration) {
        self.mock_users_response(
            ResponseTemplate::new(200)
                .set_body_json(users_json(users))
                .set_delay(delay),
        )
        .await;
    }

    /// Mount a mock for an empty user list
    pub async fn mock_users_empty(&self) {
        self.mock_users_response(ResponseTemplate::new(200).set_body_json(json!([])))
            .await;
    }

    /// Mount a mock answering the user list with a JSON `null`
    pub async fn mock_users_null(&self) {
        self.mock_users_response(ResponseTemplate::new(200).set_body_string("null"))
            .await;
    }

    /// Mount a mock for a server error on the user list
    pub async fn mock_users_server_error(&self, error_message: &str) {
        self.mock_users_response(ResponseTemplate::new(500).set_body_string(error_message))
            .await;
    }

    /// Mount a mock rejecting the user list with 401
    pub async fn mock_users_unauthorized(&self) {
        Mock::given(method("GET"))
            .and(path("/Users"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for the public user list
    pub async fn mock_public_users(&self, users: Vec<UserFixture>) {
        Mock::given(method("GET"))
            .and(path("/Users/Public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(users_json(users)))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a successful username/password login
    pub async fn mock_authenticate_success(&self, user: UserFixture) {
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "User": user.to_json(),
                "AccessToken": self.access_token,
                "ServerId": user.server_id
            })))
            .mount(&self.server)
            .await;
    }

    async fn mock_users_response(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/Users"))
            .and(authorization_matcher(&self.authorized()))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}

/// Match a request whose `Authorization` header equals `value`
///
/// wiremock stores request header values split on commas, so the expected
/// value is split the same way before comparing.
pub fn authorization_matcher(value: &str) -> HeaderExactMatcher {
    headers("Authorization", value.split(',').map(str::trim).collect())
}

fn users_json(users: Vec<UserFixture>) -> serde_json::Value {
    serde_json::Value::Array(users.into_iter().map(|u| u.to_json()).collect())
}

/// Fixture for creating Jellyfin user responses
#[derive(Debug, Clone)]
pub struct UserFixture {
    pub id: String,
    pub name: String,
    pub server_id: String,
    pub has_password: bool,
    pub is_administrator: bool,
    pub is_disabled: bool,
}

impl UserFixture {
    /// Create a regular user fixture
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            server_id: "test-server".to_string(),
            has_password: true,
            is_administrator: false,
            is_disabled: false,
        }
    }

    /// Create an administrator fixture
    pub fn admin(id: &str, name: &str) -> Self {
        let mut user = Self::new(id, name);
        user.is_administrator = true;
        user
    }

    /// Create a user fixture with a random ID
    pub fn named(name: &str) -> Self {
        Self::new(&uuid::Uuid::new_v4().simple().to_string(), name)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "Id": self.id,
            "Name": self.name,
            "ServerId": self.server_id,
            "HasPassword": self.has_password,
            "HasConfiguredPassword": self.has_password,
            "HasConfiguredEasyPassword": false,
            "EnableAutoLogin": false,
            "Policy": {
                "IsAdministrator": self.is_administrator,
                "IsDisabled": self.is_disabled,
                "IsHidden": false,
                "EnableAllFolders": true
            }
        })
    }
}
