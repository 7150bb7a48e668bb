//! Redirect rule entity and its value types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a rule's `from` value is compared against the request path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Normalized path equality (or byte equality when `from` has a query string).
    #[default]
    Exact,
    /// `*` matches any run of characters and is captured as `$N`.
    Wildcard,
    /// `from` is a regular expression; groups are captured as `$N`.
    Regex,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Wildcard => "wildcard",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "" => Ok(Self::Exact),
            "wildcard" => Ok(Self::Wildcard),
            "regex" => Ok(Self::Regex),
            other => Err(format!("unknown match type '{}'", other)),
        }
    }
}

/// HTTP status codes a rule may redirect with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RedirectStatus {
    #[default]
    MovedPermanently,
    Found,
    TemporaryRedirect,
}

impl RedirectStatus {
    /// Codes accepted when saving a rule.
    pub const ALLOWED: [u16; 3] = [301, 302, 307];

    pub fn code(&self) -> u16 {
        match self {
            Self::MovedPermanently => 301,
            Self::Found => 302,
            Self::TemporaryRedirect => 307,
        }
    }

    /// Parses an allowed code, returning `None` for anything else.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            301 => Some(Self::MovedPermanently),
            302 => Some(Self::Found),
            307 => Some(Self::TemporaryRedirect),
            _ => None,
        }
    }

    /// Interprets a stored code, falling back to 301 for unknown values.
    pub fn from_stored(code: i32) -> Self {
        u16::try_from(code)
            .ok()
            .and_then(Self::from_code)
            .unwrap_or_default()
    }
}

/// Outcome of a live test persisted against a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTestResult {
    pub status_code: Option<u16>,
    pub location: Option<String>,
    pub redirected: bool,
    pub tested_at: DateTime<Utc>,
}

/// A configured redirect.
///
/// `status_code` holds the stored value as-is; use [`RedirectRule::redirect_status`]
/// to obtain the code actually sent at dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectRule {
    pub id: String,
    pub from: String,
    pub to: String,
    pub enabled: bool,
    pub status_code: i32,
    pub match_type: MatchType,
    pub hits: i64,
    pub last_hit: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub note: Option<String>,
    /// Insertion ordinal; rules are evaluated in ascending position.
    pub position: i64,
    pub last_test: Option<RuleTestResult>,
}

impl RedirectRule {
    pub fn redirect_status(&self) -> RedirectStatus {
        RedirectStatus::from_stored(self.status_code)
    }

    /// True when the rule takes part in dispatch and cache indexing.
    pub fn is_dispatchable(&self) -> bool {
        self.enabled && !self.from.trim().is_empty() && !self.to.trim().is_empty()
    }
}

/// Input data for inserting a rule.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub id: String,
    pub from: String,
    pub to: String,
    pub enabled: bool,
    pub status_code: u16,
    pub match_type: MatchType,
    pub note: Option<String>,
    pub created: DateTime<Utc>,
}

/// Editable fields of an existing rule.
///
/// Counters, `created` and `position` are never written through an update.
#[derive(Debug, Clone)]
pub struct RuleChanges {
    pub from: String,
    pub to: String,
    pub enabled: bool,
    pub status_code: u16,
    pub match_type: MatchType,
    pub note: Option<String>,
    pub modified: DateTime<Utc>,
}

/// Caller-supplied rule data for the save operation, before validation.
#[derive(Debug, Clone, Default)]
pub struct RuleInput {
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    pub enabled: bool,
    pub status_code: Option<u16>,
    pub match_type: MatchType,
    pub note: Option<String>,
}
