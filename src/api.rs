//! Backend API consumed by the view-model
//!
//! [`ShortlinkApi`] is the controller's only external dependency. [`HttpApi`]
//! implements it over HTTP/JSON:
//!
//! - `POST   /api/links/`              - shorten a long link
//! - `GET    /api/users/{id}/links/`   - links owned by a user
//! - `GET    /api/users/`              - all users (admin)
//! - `POST   /api/users/`              - create a user
//! - `PUT    /api/users/`              - update a user
//! - `DELETE /api/users/{id}`          - delete a user
//! - `GET    /dbinit/`, `GET /demodb/` - administrative triggers

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::model::{
    CreatedResponse, FoundResponse, LinkRecord, LinkRequest, TriggerResponse, UserPayload,
    UserRecord,
};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Administrative bulk actions exposed as bare trigger endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    /// Recreate the schema; wipes all data
    InitDatabase,
    /// Insert demo users and links
    SeedDemoData,
}

impl AdminAction {
    pub fn path(self) -> &'static str {
        match self {
            AdminAction::InitDatabase => "/dbinit/",
            AdminAction::SeedDemoData => "/demodb/",
        }
    }

    /// Warning shown before the trigger is issued
    pub fn confirmation(self) -> &'static str {
        match self {
            AdminAction::InitDatabase => "Do you really want to Init DB? All data will be lost...",
            AdminAction::SeedDemoData => "Do you really want add demo data?",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminAction::InitDatabase => "Init DB",
            AdminAction::SeedDemoData => "Add demo data",
        }
    }
}

/// Operations the backend offers to the view
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortlinkApi: Send + Sync {
    /// Shortens a link and returns the identifier of the new short link
    async fn create_link(&self, request: &LinkRequest) -> Result<String>;

    /// Links owned by `user_id`, short links still as bare identifiers
    async fn user_links(&self, user_id: &str) -> Result<Vec<LinkRecord>>;

    async fn users(&self) -> Result<Vec<UserRecord>>;

    async fn create_user(&self, payload: &UserPayload) -> Result<()>;

    async fn update_user(&self, payload: &UserPayload) -> Result<()>;

    async fn delete_user(&self, id: i64) -> Result<()>;

    /// Fires an administrative trigger and returns the server's result text
    async fn trigger(&self, action: AdminAction) -> Result<String>;
}

/// HTTP implementation of [`ShortlinkApi`]
#[derive(Clone)]
pub struct HttpApi {
    http: Client,
    base_url: String,
    authorization: Option<String>,
}

impl HttpApi {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.is_empty() {
            return Err(ApiError::InvalidBaseUrl("URL cannot be empty".into()));
        }

        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            return Err(ApiError::InvalidBaseUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(format!("shortlink-view/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            authorization: None,
        })
    }

    /// Sends `value` as the `Authorization` header on every request
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into()).filter(|v: &String| !v.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/users/{id}/links/` with the id encoded as exactly one path segment
    fn user_links_url(&self, user_id: &str) -> Result<Url> {
        // Dot segments would be resolved away instead of encoded
        if user_id.is_empty() || user_id == "." || user_id == ".." {
            return Err(ApiError::InvalidUserId(user_id.to_string()));
        }

        let mut url = Url::parse(&self.url("/api/users/"))
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend([user_id, "links", ""]);
        Ok(url)
    }

    /// Sends a request and returns the body of a 2xx response
    async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let request = match &self.authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            debug!(status = status.as_u16(), body = %body, "API request rejected");
            Err(ApiError::from_body(status.as_u16(), &body))
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::Decode(format!("failed to parse {}: {}", what, e)))
}

#[async_trait]
impl ShortlinkApi for HttpApi {
    async fn create_link(&self, request: &LinkRequest) -> Result<String> {
        let url = self.url("/api/links/");
        debug!(url = %url, long_link = %request.long_link, "Creating short link");

        let body = self.execute(self.http.post(&url).json(request)).await?;
        let created: CreatedResponse = decode(&body, "created link")?;
        Ok(created.created)
    }

    async fn user_links(&self, user_id: &str) -> Result<Vec<LinkRecord>> {
        let url = self.user_links_url(user_id)?;
        debug!(url = %url, "Fetching user links");

        let body = self.execute(self.http.get(url)).await?;
        let found: FoundResponse<LinkRecord> = decode(&body, "links")?;
        Ok(found.into_records())
    }

    async fn users(&self) -> Result<Vec<UserRecord>> {
        let url = self.url("/api/users/");
        debug!(url = %url, "Fetching users");

        let body = self.execute(self.http.get(&url)).await?;
        let found: FoundResponse<UserRecord> = decode(&body, "users")?;
        Ok(found.into_records())
    }

    async fn create_user(&self, payload: &UserPayload) -> Result<()> {
        let url = self.url("/api/users/");
        debug!(url = %url, username = ?payload.username, "Creating user");

        self.execute(self.http.post(&url).json(payload)).await?;
        Ok(())
    }

    async fn update_user(&self, payload: &UserPayload) -> Result<()> {
        let url = self.url("/api/users/");
        debug!(url = %url, id = ?payload.id, status = %payload.status, "Updating user");

        self.execute(self.http.put(&url).json(payload)).await?;
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/api/users/{}", id));
        debug!(url = %url, "Deleting user");

        self.execute(self.http.delete(&url)).await?;
        Ok(())
    }

    async fn trigger(&self, action: AdminAction) -> Result<String> {
        let url = self.url(action.path());
        debug!(url = %url, action = action.label(), "Firing admin trigger");

        let body = self.execute(self.http.get(&url)).await?;
        // Older backends answer with plain text instead of {"result": ...}
        let result = serde_json::from_str::<TriggerResponse>(&body)
            .ok()
            .and_then(|response| response.result)
            .unwrap_or_else(|| body.trim().to_string());

        Ok(if result.is_empty() { "OK".to_string() } else { result })
    }
}
