//! Error types for the shortlink view-model
//!
//! Two families live here:
//! - [`ApiError`] covers everything that can go wrong while talking to the backend
//! - [`ConfigError`] covers start-up configuration and host-page metadata

use thiserror::Error;

/// Errors returned by a [`crate::api::ShortlinkApi`] implementation
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or transport failure (connection refused, timeout, TLS, ...)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is taken from the response body when it
    /// carries one, otherwise only the numeric status is known.
    #[error("server error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// API base URL rejected at construction time
    #[error("invalid API URL: {0}")]
    InvalidBaseUrl(String),

    /// User id that cannot be addressed as a single path segment
    #[error("invalid user id '{0}'")]
    InvalidUserId(String),
}

impl ApiError {
    /// Text shown to the user for this failure.
    ///
    /// Follows the backend contract: the body's message when present,
    /// otherwise the numeric status code.
    pub fn message(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Status {
                status,
                message: None,
            } => status.to_string(),
            other => other.to_string(),
        }
    }

    /// Builds a status error from a raw response body.
    ///
    /// The backend reports failures under `message`, `error` or (for the
    /// admin triggers) `result`; the first string field found wins.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error", "result"].iter().find_map(|key| {
                    value
                        .get(key)
                        .and_then(|field| field.as_str())
                        .filter(|text| !text.is_empty())
                        .map(str::to_string)
                })
            });

        ApiError::Status { status, message }
    }
}

/// Errors raised while assembling configuration or the page context
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid origin '{0}': must be an absolute http(s) URL")]
    InvalidOrigin(String),

    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("failed to read host page: {0}")]
    HostPage(#[from] std::io::Error),
}
