//! Path normalization and rule-path formatting utilities.
//!
//! Two distinct representations of a path exist:
//!
//! - The **normalized** form ([`normalize_path`]) used for cache keys and
//!   dispatch-time comparison: query stripped, lowercased, one leading slash,
//!   no trailing slash.
//! - The **formatted** form ([`format_rule_path`]) persisted and displayed:
//!   case is preserved and the trailing slash follows the site's permalink
//!   convention.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Matches a URI scheme prefix (`https://`, `ftp://`, ...) or a protocol-relative `//`.
static ABSOLUTE_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.\-]*:)?//").unwrap());

/// Canonicalizes a request path for comparison.
///
/// # Rules
///
/// 1. Everything from the first `?` is removed
/// 2. The path is lowercased
/// 3. Leading and trailing slashes are trimmed
/// 4. A single leading slash is re-added
///
/// The function is idempotent: `normalize_path(&normalize_path(p)) == normalize_path(p)`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_path("/Old-Page/?utm=1"), "/old-page");
/// assert_eq!(normalize_path(""), "/");
/// assert_eq!(normalize_path("//"), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
    let without_query = path.split_once('?').map_or(path, |(head, _)| head);
    let lowered = without_query.to_lowercase();
    format!("/{}", lowered.trim_matches('/'))
}

/// Returns true if the value carries a scheme (or is protocol-relative).
pub fn is_absolute_url(value: &str) -> bool {
    ABSOLUTE_URL_REGEX.is_match(value.trim())
}

/// Splits a raw request URI into its path and optional query string.
///
/// An empty query (`/page?`) is reported as `None`.
pub fn split_query(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('?') {
        Some((path, query)) if !query.is_empty() => (path, Some(query)),
        Some((path, _)) => (path, None),
        None => (uri, None),
    }
}

/// Formats a relative rule path for storage.
///
/// Absolute URLs are returned unchanged (trimmed). Relative values get exactly
/// one leading slash. The trailing slash is added or removed according to
/// `trailing_slash`, except when the value:
///
/// - contains a query string (`/page?id=1`)
/// - contains a wildcard or a `$N` placeholder (`/old/*`, `/new/$1`)
/// - names a file in its last segment (`/feed.xml`)
///
/// The root path is always `/`.
pub fn format_rule_path(value: &str, trailing_slash: bool) -> String {
    let value = value.trim();

    if is_absolute_url(value) {
        return value.to_string();
    }

    let body = value.trim_start_matches('/');

    if body.contains(['?', '*', '$']) {
        return format!("/{}", body);
    }

    let body = body.trim_end_matches('/');
    if body.is_empty() {
        return "/".to_string();
    }

    let last_segment = body.rsplit('/').next().unwrap_or(body);
    if last_segment.contains('.') || !trailing_slash {
        format!("/{}", body)
    } else {
        format!("/{}/", body)
    }
}

/// Computes the cache key for a configured `from` or `to` value.
///
/// Absolute URLs pointing at the site itself are reduced to their path so that
/// `https://site.test/about` and `/about` share a key. Foreign URLs are
/// normalized as opaque strings.
pub fn cache_key(value: &str, site_host: Option<&str>) -> String {
    let value = value.trim();

    if is_absolute_url(value)
        && let Ok(url) = Url::parse(value)
        && let (Some(host), Some(site)) = (url.host_str(), site_host)
        && host.eq_ignore_ascii_case(site)
    {
        return normalize_path(url.path());
    }

    normalize_path(value)
}
