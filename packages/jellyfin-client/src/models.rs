//! Jellyfin API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user account known to the Jellyfin server
///
/// Fields the client does not model are kept in `extra` so the account is
/// preserved exactly as the server returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserAccount {
    /// Server-assigned user ID
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// ID of the server that owns the account
    #[serde(default)]
    pub server_id: Option<String>,
    /// Whether the account has a password
    #[serde(default)]
    pub has_password: bool,
    /// Whether the password was explicitly configured
    #[serde(default)]
    pub has_configured_password: bool,
    /// Last successful login
    #[serde(default)]
    pub last_login_date: Option<DateTime<Utc>>,
    /// Last recorded activity
    #[serde(default)]
    pub last_activity_date: Option<DateTime<Utc>>,
    /// Tag of the primary profile image, if one is set
    #[serde(default)]
    pub primary_image_tag: Option<String>,
    /// Access policy
    #[serde(default)]
    pub policy: Option<UserPolicy>,
    /// Remaining server metadata
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserAccount {
    /// Whether the account has administrator rights
    pub fn is_administrator(&self) -> bool {
        self.policy.as_ref().is_some_and(|p| p.is_administrator)
    }

    /// Whether the account is disabled on the server
    pub fn is_disabled(&self) -> bool {
        self.policy.as_ref().is_some_and(|p| p.is_disabled)
    }
}

/// Subset of the Jellyfin user policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPolicy {
    #[serde(default)]
    pub is_administrator: bool,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a successful username/password authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    /// The authenticated user
    pub user: Option<UserAccount>,
    /// Access token for subsequent requests
    pub access_token: String,
    /// ID of the server that issued the token
    #[serde(default)]
    pub server_id: Option<String>,
}

/// Body of `POST /Users/AuthenticateByName`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthenticateByNameRequest<'a> {
    pub username: &'a str,
    pub pw: &'a str,
}
