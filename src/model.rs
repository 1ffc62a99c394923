//! Data models for the shortlink view-model
//!
//! Wire records exchanged with the backend API. Field names follow the
//! backend's snake_case JSON; empty values are omitted by the backend, so
//! every read-side field has a default.

use serde::{Deserialize, Serialize};

/// Request payload for shortening a long link
///
/// # Example
/// ```json
/// {
///   "long_link": "https://example.com/very/long/url",
///   "is_active": true
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// The original URL to be shortened
    pub long_link: String,

    /// Whether the created short link resolves immediately
    pub is_active: bool,
}

impl Default for LinkRequest {
    fn default() -> Self {
        Self {
            long_link: String::new(),
            is_active: true,
        }
    }
}

/// A link owned by a user, as listed on the dashboard
///
/// Read-only from the view's perspective. `short_link` arrives as a bare
/// identifier and is rewritten into an absolute URL before display.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRecord {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub short_link: String,

    #[serde(default)]
    pub long_link: String,

    /// Number of times the short link has been followed
    #[serde(default)]
    pub click_counter: u64,

    #[serde(default)]
    pub owner_id: i64,

    #[serde(default)]
    pub is_active: bool,
}

/// Account status; travels as the boolean `user_status` on the wire
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(from = "bool", into = "bool")]
pub enum UserStatus {
    #[default]
    Enabled,
    Disabled,
}

impl UserStatus {
    pub fn is_enabled(self) -> bool {
        matches!(self, UserStatus::Enabled)
    }

    /// The opposite status, as requested by a quick toggle
    pub fn toggled(self) -> Self {
        match self {
            UserStatus::Enabled => UserStatus::Disabled,
            UserStatus::Disabled => UserStatus::Enabled,
        }
    }

    /// Verb describing the transition away from this status
    pub fn toggle_verb(self) -> &'static str {
        match self {
            UserStatus::Enabled => "disable",
            UserStatus::Disabled => "enable",
        }
    }
}

impl From<bool> for UserStatus {
    fn from(enabled: bool) -> Self {
        if enabled {
            UserStatus::Enabled
        } else {
            UserStatus::Disabled
        }
    }
}

impl From<UserStatus> for bool {
    fn from(status: UserStatus) -> Self {
        status.is_enabled()
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Enabled => write!(f, "enabled"),
            UserStatus::Disabled => write!(f, "disabled"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" | "enable" | "true" | "on" => Ok(UserStatus::Enabled),
            "disabled" | "disable" | "false" | "off" => Ok(UserStatus::Disabled),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// A user account as listed on the users page
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub username: String,

    /// Write-only: accepted from the backend but never sent back from a record
    #[serde(default, skip_serializing)]
    pub password: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(rename = "user_status", default)]
    pub status: UserStatus,
}

/// Write payload for `POST /api/users/` and `PUT /api/users/`
///
/// Text fields are present only when non-empty. `user_status` is always
/// sent: "disabled" is an explicit value, never an omission.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(rename = "user_status")]
    pub status: UserStatus,
}

impl UserPayload {
    /// Payload for a quick status flip: only the id and the new status
    pub fn status_change(id: i64, status: UserStatus) -> Self {
        Self {
            id: Some(id),
            status,
            ..Self::default()
        }
    }
}

/// Successful response of `POST /api/links/`
#[derive(Deserialize, Debug)]
pub struct CreatedResponse {
    /// Identifier (token) of the new short link
    pub created: String,
}

/// Successful response of the collection reads
///
/// The backend sends `"found": null` for an empty search.
#[derive(Deserialize, Debug)]
pub struct FoundResponse<T> {
    #[serde(default = "Option::default")]
    pub found: Option<Vec<T>>,
}

impl<T> FoundResponse<T> {
    pub fn into_records(self) -> Vec<T> {
        self.found.unwrap_or_default()
    }
}

/// Response of the `/dbinit/` and `/demodb/` triggers
#[derive(Deserialize, Debug, Default)]
pub struct TriggerResponse {
    #[serde(default)]
    pub result: Option<String>,
}
