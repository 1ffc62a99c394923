//! Runtime configuration
//!
//! Loaded once from environment variables (a `.env` file is honoured by the
//! binary through `dotenvy`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::context::{Origin, PageContext, PageKind};
use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// View configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the backend API
    pub api_url: String,
    /// Public origin short links resolve under
    pub origin: Origin,
    /// Rendered host page whose `<meta>` tags describe the page context
    pub host_page: Option<PathBuf>,
    /// User id when no host page is given
    pub user_id: Option<String>,
    /// Page kind when no host page is given
    pub page: PageKind,
    /// Value of the `Authorization` header, if the backend wants one
    pub authorization: Option<String>,
    /// Upper bound for a single request
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `SHORTLINK_API_URL`: backend root (default: "http://localhost:8080")
    /// - `SHORTLINK_ORIGIN`: public origin of short links (default: origin of the API URL)
    /// - `SHORTLINK_HOST_PAGE`: path to a rendered page carrying `userid` / `page_template` meta tags
    /// - `SHORTLINK_USER_ID`: current user id, used without a host page
    /// - `SHORTLINK_PAGE`: `dashboard`, `users` or anything else, used without a host page
    /// - `AUTHORIZATION`: sent as the `Authorization` header when set
    /// - `SHORTLINK_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = var("SHORTLINK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let origin = Origin::parse(&var("SHORTLINK_ORIGIN").unwrap_or_else(|| api_url.clone()))?;

        let request_timeout = match var("SHORTLINK_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidNumber {
                    name: "SHORTLINK_TIMEOUT_SECS",
                    value: value.clone(),
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            origin,
            host_page: var("SHORTLINK_HOST_PAGE").map(PathBuf::from),
            user_id: var("SHORTLINK_USER_ID"),
            page: var("SHORTLINK_PAGE")
                .map(|token| PageKind::from_token(&token))
                .unwrap_or_default(),
            authorization: var("AUTHORIZATION"),
            request_timeout,
        })
    }

    /// Resolves the page context: the host page's metadata when one is
    /// configured, otherwise the plain settings.
    pub async fn page_context(&self) -> Result<PageContext, ConfigError> {
        match &self.host_page {
            Some(path) => {
                let html = tokio::fs::read_to_string(path).await?;
                Ok(PageContext::from_host_page(&html))
            }
            None => Ok(PageContext::new(self.user_id.clone(), self.page)),
        }
    }
}

/// Non-empty environment variable
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that modify env vars must not run in parallel
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 7] = [
        "SHORTLINK_API_URL",
        "SHORTLINK_ORIGIN",
        "SHORTLINK_HOST_PAGE",
        "SHORTLINK_USER_ID",
        "SHORTLINK_PAGE",
        "AUTHORIZATION",
        "SHORTLINK_TIMEOUT_SECS",
    ];

    fn clear() {
        for name in VARS {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear();

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.origin.as_str(), "http://localhost:8080");
        assert_eq!(config.page, PageKind::Other);
        assert_eq!(config.user_id, None);
        assert_eq!(config.authorization, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear();
        env::set_var("SHORTLINK_API_URL", "http://api.internal:9000");
        env::set_var("SHORTLINK_ORIGIN", "https://sho.rt/");
        env::set_var("SHORTLINK_USER_ID", "12");
        env::set_var("SHORTLINK_PAGE", "dashboard");
        env::set_var("SHORTLINK_TIMEOUT_SECS", "5");

        let config = Config::from_env().unwrap();
        assert_eq!(config.origin.as_str(), "https://sho.rt");
        assert_eq!(config.page, PageKind::Dashboard);
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        env::set_var("SHORTLINK_TIMEOUT_SECS", "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidNumber { .. })
        ));

        env::set_var("SHORTLINK_TIMEOUT_SECS", "5");
        env::set_var("SHORTLINK_ORIGIN", "sho.rt");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidOrigin(_))));

        clear();
    }

    #[tokio::test]
    async fn test_page_context_prefers_host_page() {
        let config = Config {
            api_url: DEFAULT_API_URL.to_string(),
            origin: Origin::parse(DEFAULT_API_URL).unwrap(),
            host_page: None,
            user_id: Some("3".into()),
            page: PageKind::Users,
            authorization: None,
            request_timeout: Duration::from_secs(1),
        };
        let context = config.page_context().await.unwrap();
        assert_eq!(context, PageContext::new(Some("3".into()), PageKind::Users));

        let host_page = tempfile::NamedTempFile::new().unwrap();
        tokio::fs::write(
            host_page.path(),
            r#"<meta name="userid" content="8"><meta name="page_template" content="dashboard">"#,
        )
        .await
        .unwrap();

        let config = Config {
            host_page: Some(host_page.path().to_path_buf()),
            ..config
        };
        let context = config.page_context().await.unwrap();
        assert_eq!(context, PageContext::new(Some("8".into()), PageKind::Dashboard));

        // Removed from disk once dropped
        drop(host_page);
        assert!(matches!(
            config.page_context().await,
            Err(ConfigError::HostPage(_))
        ));
    }
}
