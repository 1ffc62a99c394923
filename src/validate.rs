//! Long-link validation
//!
//! Runs on every edit of the long-link input and drives the "valid"
//! indicator. It never blocks submission; the backend stays the authority.

use url::Url;

/// Schemes a long link may use
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Returns true when `candidate` is an absolute http(s) URL with an explicit
/// scheme and a host.
///
/// Scheme-relative (`//example.com`), relative (`/path`) and bare-host
/// (`example.com`) forms are rejected, as is anything containing whitespace.
pub fn is_valid_long_link(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }

    // The parser is lenient about backslashes and missing slashes after the
    // scheme; the input must spell out "scheme://" itself.
    let Some((scheme, _)) = candidate.split_once("://") else {
        return false;
    };
    if !ALLOWED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return false;
    }

    match Url::parse(candidate) {
        Ok(url) => url
            .host_str()
            .map(|host| !host.is_empty())
            .unwrap_or(false),
        Err(_) => false,
    }
}
