//! Rule matching: request targets, compiled patterns and target building.
//!
//! Everything here is pure and synchronous. The dispatcher in
//! [`crate::application::services::DispatchService`] drives it per request.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use crate::domain::entities::{MatchType, RedirectRule};
use crate::utils::path_normalizer::{cache_key, is_absolute_url, normalize_path, split_query};

/// Compiled-size ceiling for user supplied patterns.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Number of distinct patterns kept before the memo is reset.
const PATTERN_CACHE_CAPACITY: usize = 1024;

/// Delimiters accepted around a regex pattern (`#^/old/(.*)$#i`).
const REGEX_DELIMITERS: &[char] = &['/', '#', '~', '@', '!', '%', '+', '|'];

/// Trailing modifier letters accepted after a closing delimiter.
const REGEX_FLAGS: &str = "imsxuU";

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\d{1,2})").unwrap());

/// Errors produced when a rule's pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),
}

/// The request path a dispatch is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Path and query exactly as received.
    pub raw_uri: String,
    pub path: String,
    pub query: Option<String>,
    /// [`normalize_path`] of `path`.
    pub normalized: String,
}

impl RequestTarget {
    /// Builds a target from a raw request URI (`/path?query`).
    pub fn new(raw_uri: &str) -> Self {
        let (path, query) = split_query(raw_uri);

        Self {
            raw_uri: raw_uri.to_string(),
            path: path.to_string(),
            query: query.map(str::to_string),
            normalized: normalize_path(path),
        }
    }

    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }
}

/// A rule's `from` value prepared for matching.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    /// `from` carries a query string: the raw request URI must equal it.
    ExactUri(String),
    /// Normalized path equality.
    ExactPath(String),
    /// Wildcard or regex rule compiled to an anchored or user regex.
    Pattern(Arc<Regex>),
}

impl CompiledPattern {
    /// Compiles a `from` value for the given match type.
    ///
    /// `site_host` lets exact rules written as absolute site URLs match by path.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for empty values or regexes that fail to compile.
    pub fn compile(
        match_type: MatchType,
        from: &str,
        site_host: Option<&str>,
    ) -> Result<Self, PatternError> {
        let from = from.trim();
        if from.is_empty() {
            return Err(PatternError::Empty);
        }

        match match_type {
            MatchType::Exact if from.contains('?') => Ok(Self::ExactUri(from.to_string())),
            MatchType::Exact => Ok(Self::ExactPath(cache_key(from, site_host))),
            MatchType::Wildcard => build_regex(&wildcard_to_regex(from)).map(Self::Pattern),
            MatchType::Regex => build_regex(&user_regex(from)).map(Self::Pattern),
        }
    }

    /// Matches the target, returning the capture groups on success.
    ///
    /// Index 0 holds the whole match; exact patterns yield no groups.
    pub fn matches(&self, target: &RequestTarget) -> Option<Vec<String>> {
        match self {
            Self::ExactUri(from) => (target.raw_uri == *from).then(Vec::new),
            Self::ExactPath(normalized) => {
                if *normalized != target.normalized {
                    return None;
                }
                // A root rule must not swallow `/?preview=1` and the like.
                if normalized == "/" && target.has_query() {
                    return None;
                }
                Some(Vec::new())
            }
            Self::Pattern(regex) => regex.captures(&target.normalized).map(|caps| {
                caps.iter()
                    .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect()
            }),
        }
    }
}

/// Converts a wildcard `from` into an anchored, case-insensitive regex.
///
/// The value is normalized first; each `*` becomes a greedy `(.*)` group and
/// every other character is matched literally.
pub fn wildcard_to_regex(from: &str) -> String {
    let normalized = normalize_path(from);
    let body = normalized
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("(.*)");

    format!("(?i)^{}$", body)
}

/// Prepares a user regex: strips a `#...#flags` style delimiter pair if present
/// and forces case-insensitive matching.
pub fn user_regex(from: &str) -> String {
    let (pattern, flags) = strip_delimiters(from);
    let mut inline: String = flags.chars().filter(|c| *c != 'u').collect();
    if !inline.contains('i') {
        inline.push('i');
    }

    format!("(?{}){}", inline, pattern)
}

fn strip_delimiters(from: &str) -> (&str, &str) {
    let Some(open) = from.chars().next() else {
        return (from, "");
    };
    if !REGEX_DELIMITERS.contains(&open) {
        return (from, "");
    }

    match from[1..].rfind(open) {
        Some(offset) => {
            let close = offset + 1;
            let flags = &from[close + 1..];
            if flags.chars().all(|c| REGEX_FLAGS.contains(c)) {
                (&from[1..close], flags)
            } else {
                (from, "")
            }
        }
        None => (from, ""),
    }
}

fn build_regex(pattern: &str) -> Result<Arc<Regex>, PatternError> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map(Arc::new)
        .map_err(|e| PatternError::InvalidRegex(e.to_string()))
}

/// Replaces `$N` placeholders with capture group `N` (empty if absent).
pub fn substitute(to: &str, captures: &[String]) -> String {
    if captures.is_empty() {
        return to.to_string();
    }

    PLACEHOLDER_REGEX
        .replace_all(to, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| captures.get(n))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Builds the final `Location` for a matched rule.
///
/// 1. `$N` placeholders are substituted
/// 2. Relative targets are resolved against `site_url`
/// 3. The request's query string is carried over when the configured target
///    is relative and has no query of its own
pub fn build_location(
    to: &str,
    captures: &[String],
    target: &RequestTarget,
    site_url: &str,
) -> String {
    let substituted = substitute(to.trim(), captures);

    let mut location = if is_absolute_url(&substituted) {
        substituted
    } else {
        format!(
            "{}/{}",
            site_url.trim_end_matches('/'),
            substituted.trim_start_matches('/')
        )
    };

    if let Some(query) = &target.query
        && !location.contains('?')
        && !is_absolute_url(to.trim())
    {
        location.push('?');
        location.push_str(query);
    }

    location
}

/// Process-wide memo of compiled patterns, including compile failures.
///
/// Keyed by match type and raw `from`, so edits naturally miss the memo.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: Mutex<HashMap<(MatchType, String), Result<CompiledPattern, PatternError>>>,
    site_host: Option<String>,
}

impl PatternCache {
    pub fn new(site_host: Option<String>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            site_host,
        }
    }

    /// Returns the compiled pattern for a rule, compiling it on first use.
    pub fn get(&self, rule: &RedirectRule) -> Result<CompiledPattern, PatternError> {
        let key = (rule.match_type, rule.from.clone());
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(found) = entries.get(&key) {
            return found.clone();
        }

        if entries.len() >= PATTERN_CACHE_CAPACITY {
            entries.clear();
        }

        let compiled =
            CompiledPattern::compile(rule.match_type, &rule.from, self.site_host.as_deref());
        entries.insert(key, compiled.clone());
        compiled
    }
}
