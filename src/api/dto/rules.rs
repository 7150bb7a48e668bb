//! DTOs for rule management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};
use validator::Validate;

use crate::domain::entities::{IncomingRef, MatchType, RedirectRule, RuleInput, RuleTestResult};

/// JSON representation of a stored rule.
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleResponse {
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
    pub position: i64,
    pub last_test: Option<RuleTestResult>,
}

impl From<RedirectRule> for RuleResponse {
    fn from(rule: RedirectRule) -> Self {
        Self {
            id: rule.id,
            from: rule.from,
            to: rule.to,
            enabled: rule.enabled,
            status_code: rule.status_code,
            match_type: rule.match_type,
            hits: rule.hits,
            last_hit: rule.last_hit,
            created: rule.created,
            modified: rule.modified,
            note: rule.note,
            position: rule.position,
            last_test: rule.last_test,
        }
    }
}

/// Response for `GET /api/rules`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RuleListResponse {
    pub total: usize,
    pub rules: Vec<RuleResponse>,
}

fn default_enabled() -> bool {
    true
}

/// Request body for `POST /api/rules`.
///
/// Without `id` a new rule is created; with `id` the existing rule is replaced
/// (counters and creation time are kept). Empty `id` and `note` strings are
/// treated as absent.
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct SaveRuleRequest {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub id: Option<String>,

    #[validate(length(max = 2048, message = "Source is too long"))]
    pub from: String,

    #[validate(length(max = 2048, message = "Destination is too long"))]
    pub to: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub status_code: Option<u16>,

    #[serde(default)]
    pub match_type: MatchType,

    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[validate(length(max = 1000, message = "Note is too long"))]
    pub note: Option<String>,
}

impl From<SaveRuleRequest> for RuleInput {
    fn from(req: SaveRuleRequest) -> Self {
        Self {
            id: req.id,
            from: req.from,
            to: req.to,
            enabled: req.enabled,
            status_code: req.status_code,
            match_type: req.match_type,
            note: req.note,
        }
    }
}

/// Request body for `POST /api/rules/import`.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(max = 1048576, message = "Import payload is too large"))]
    pub text: String,
}

/// Query for `GET /api/rules/incoming`.
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

/// Response for `GET /api/rules/incoming`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IncomingResponse {
    pub path: String,
    /// Where `path` itself redirects to, if anywhere.
    pub redirects_to: Option<String>,
    pub incoming: Vec<IncomingRef>,
}

/// Request body for `POST /api/rules/{id}/test-result`.
#[derive(Debug, Deserialize)]
pub struct TestResultRequest {
    pub status_code: Option<u16>,
    pub location: Option<String>,
    #[serde(default)]
    pub redirected: bool,
    /// Defaults to the time the result is received.
    pub tested_at: Option<DateTime<Utc>>,
}

impl From<TestResultRequest> for RuleTestResult {
    fn from(req: TestResultRequest) -> Self {
        Self {
            status_code: req.status_code,
            location: req.location,
            redirected: req.redirected,
            tested_at: req.tested_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_request_defaults() {
        let req: SaveRuleRequest =
            serde_json::from_str(r#"{"from": "/old", "to": "/new"}"#).unwrap();

        assert!(req.id.is_none());
        assert!(req.enabled);
        assert_eq!(req.match_type, MatchType::Exact);
        assert!(req.status_code.is_none());
        assert!(req.note.is_none());
    }

    #[test]
    fn test_empty_id_and_note_are_absent() {
        let req: SaveRuleRequest = serde_json::from_str(
            r#"{"id": "", "from": "/old", "to": "/new", "note": "", "match_type": "wildcard"}"#,
        )
        .unwrap();

        assert!(req.id.is_none());
        assert!(req.note.is_none());
        assert_eq!(req.match_type, MatchType::Wildcard);
    }

    #[test]
    fn test_oversized_source_fails_validation() {
        let req = SaveRuleRequest {
            id: None,
            from: "a".repeat(2049),
            to: "/new".to_string(),
            enabled: true,
            status_code: None,
            match_type: MatchType::Exact,
            note: None,
        };
        assert!(req.validate().is_err());
    }
}
