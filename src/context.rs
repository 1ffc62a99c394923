//! Page context: which page the controller runs on, for which user, and
//! under which public origin.
//!
//! The context is read once from the host page and handed to the controller
//! at construction. Nothing re-reads it per call.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

use crate::error::ConfigError;

/// Name of the `<meta>` tag carrying the current user's id
pub const META_USER_ID: &str = "userid";

/// Name of the `<meta>` tag carrying the page template token
pub const META_PAGE_TEMPLATE: &str = "page_template";

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta tag pattern"));

static META_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(name|content)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid meta attribute pattern")
});

/// Which page the view is mounted on
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Personal dashboard: shortener panel plus the user's link list
    Dashboard,
    /// Admin user management
    Users,
    /// Any other page (landing shortener, embedded widgets)
    #[default]
    Other,
}

impl PageKind {
    /// Maps a page-template token. Unknown tokens fall into `Other`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "dashboard" => PageKind::Dashboard,
            "users" => PageKind::Users,
            _ => PageKind::Other,
        }
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageKind::Dashboard => write!(f, "dashboard"),
            PageKind::Users => write!(f, "users"),
            PageKind::Other => write!(f, "other"),
        }
    }
}

/// Read-once knowledge of the page and its user
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Id of the signed-in user; absent on public pages
    pub user_id: Option<String>,

    pub kind: PageKind,
}

impl PageContext {
    pub fn new(user_id: Option<String>, kind: PageKind) -> Self {
        let user_id = user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self { user_id, kind }
    }

    /// Builds the context from the `<meta>` tags of a rendered host page.
    ///
    /// ```
    /// # use shortlink_view::context::{PageContext, PageKind};
    /// let html = r#"<head>
    ///   <meta name="userid" content="42">
    ///   <meta name="page_template" content="dashboard">
    /// </head>"#;
    /// let context = PageContext::from_host_page(html);
    /// assert_eq!(context.user_id.as_deref(), Some("42"));
    /// assert_eq!(context.kind, PageKind::Dashboard);
    /// ```
    pub fn from_host_page(html: &str) -> Self {
        let meta = meta_tags(html);
        let kind = meta
            .get(META_PAGE_TEMPLATE)
            .map(|token| PageKind::from_token(token))
            .unwrap_or_default();

        Self::new(meta.get(META_USER_ID).cloned(), kind)
    }
}

/// Collects `name -> content` pairs of every `<meta>` tag in the document.
/// The first occurrence of a name wins.
fn meta_tags(html: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();

    for tag in META_TAG.find_iter(html) {
        let mut name = None;
        let mut content = None;

        for attr in META_ATTR.captures_iter(tag.as_str()) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            match attr[1].to_ascii_lowercase().as_str() {
                "name" => name = Some(value),
                _ => content = Some(value),
            }
        }

        if let (Some(name), Some(content)) = (name, content) {
            tags.entry(name).or_insert(content);
        }
    }

    tags
}

/// Public origin (`scheme://host[:port]`) under which short links resolve
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Parses any absolute http(s) URL and keeps only its origin.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(input.trim()).map_err(|_| ConfigError::InvalidOrigin(input.into()))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidOrigin(input.into()));
        }

        Ok(Self(url.origin().ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public short URL for an identifier issued by the backend
    pub fn short_url(&self, identifier: &str) -> String {
        format!("{}/{}", self.0, identifier.trim_start_matches('/'))
    }

    /// Rewrites a stored short link into an absolute URL.
    ///
    /// Values that are already absolute are kept as they are.
    pub fn absolutize(&self, short_link: &str) -> String {
        match Url::parse(short_link) {
            Ok(url) if url.has_host() => short_link.to_string(),
            _ => self.short_url(short_link),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
