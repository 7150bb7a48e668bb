//! Rule management: validation, formatting and persistence.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::application::services::RedirectCacheService;
use crate::domain::entities::{
    MatchType, NewRule, RedirectRule, RedirectStatus, RuleChanges, RuleInput, RuleTestResult,
};
use crate::domain::matcher::CompiledPattern;
use crate::domain::repositories::RuleRepository;
use crate::error::{AppError, ErrorInfo};
use crate::utils::import_parser::parse_import;
use crate::utils::path_normalizer::format_rule_path;
use crate::utils::rule_id::generate_rule_id;

/// Outcome of a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    /// Per-line failures: parse problems and rules rejected on save.
    pub errors: Vec<ImportLineError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportLineError {
    pub line: usize,
    pub error: ErrorInfo,
}

/// Service owning every write to the rule store.
///
/// Each successful mutation rebuilds the redirect index so that lookups never
/// serve a deleted or edited rule.
pub struct RuleService {
    rules: Arc<dyn RuleRepository>,
    cache: Arc<RedirectCacheService>,
    trailing_slash: bool,
}

impl RuleService {
    /// Creates a new rule service.
    ///
    /// # Arguments
    ///
    /// - `rules` - authoritative rule store
    /// - `cache` - redirect index rebuilt after every mutation
    /// - `trailing_slash` - the site's permalink convention for relative paths
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        cache: Arc<RedirectCacheService>,
        trailing_slash: bool,
    ) -> Self {
        Self {
            rules,
            cache,
            trailing_slash,
        }
    }

    /// Returns every rule in store order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn get_all(&self) -> Result<Vec<RedirectRule>, AppError> {
        self.rules.list().await
    }

    /// Retrieves a single rule.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no rule has this id.
    pub async fn get(&self, id: &str) -> Result<RedirectRule, AppError> {
        self.rules
            .find(id)
            .await?
            .ok_or_else(|| rule_not_found(id))
    }

    /// Creates or updates a rule and rebuilds the redirect index.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - `from` or `to` is empty after trimming
    /// - the status code is not 301, 302 or 307
    /// - a regex or wildcard pattern does not compile
    ///
    /// Returns [`AppError::NotFound`] if `id` is given but unknown.
    pub async fn save(&self, input: RuleInput) -> Result<RedirectRule, AppError> {
        let saved = self.persist(input).await?;
        self.rebuild_cache().await;
        Ok(saved)
    }

    /// Deletes a rule and rebuilds the redirect index.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no rule has this id.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.rules.delete(id).await? {
            return Err(rule_not_found(id));
        }

        info!(rule_id = %id, "Rule deleted");
        self.rebuild_cache().await;
        Ok(())
    }

    /// Imports `from,to[,note]` lines as enabled 301 rules.
    ///
    /// Lines without a source or destination are counted as skipped. A line
    /// whose rule fails validation is reported in `errors` and does not stop
    /// the import. The index is rebuilt once at the end.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] only when storage fails.
    pub async fn import(&self, text: &str) -> Result<ImportSummary, AppError> {
        let parsed = parse_import(text);

        let mut summary = ImportSummary {
            imported: 0,
            skipped: parsed.skipped.len(),
            errors: parsed
                .skipped
                .iter()
                .map(|s| ImportLineError {
                    line: s.line,
                    error: AppError::bad_request(s.reason, json!({})).to_error_info(),
                })
                .collect(),
        };

        for row in parsed.rows {
            let match_type = if row.from.contains('*') {
                MatchType::Wildcard
            } else {
                MatchType::Exact
            };

            let input = RuleInput {
                id: None,
                from: row.from,
                to: row.to,
                enabled: true,
                status_code: Some(RedirectStatus::MovedPermanently.code()),
                match_type,
                note: row.note,
            };

            match self.persist(input).await {
                Ok(_) => summary.imported += 1,
                Err(e @ AppError::Internal { .. }) => return Err(e),
                Err(e) => {
                    summary.skipped += 1;
                    summary.errors.push(ImportLineError {
                        line: row.line,
                        error: e.to_error_info(),
                    });
                }
            }
        }

        if summary.imported > 0 {
            self.rebuild_cache().await;
        }

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "Rules imported"
        );

        Ok(summary)
    }

    /// Stores a live-test outcome against a rule.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no rule has this id.
    pub async fn record_test_result(
        &self,
        id: &str,
        result: RuleTestResult,
    ) -> Result<(), AppError> {
        if !self.rules.record_test(id, result).await? {
            return Err(rule_not_found(id));
        }
        Ok(())
    }

    /// Validates and writes a rule without touching the index.
    async fn persist(&self, input: RuleInput) -> Result<RedirectRule, AppError> {
        let from = input.from.trim();
        let to = input.to.trim();

        if from.is_empty() {
            return Err(AppError::bad_request(
                "Source path is required",
                json!({ "field": "from" }),
            ));
        }
        if to.is_empty() {
            return Err(AppError::bad_request(
                "Destination is required",
                json!({ "field": "to" }),
            ));
        }

        let status = match input.status_code {
            None => RedirectStatus::default(),
            Some(code) => RedirectStatus::from_code(code).ok_or_else(|| {
                AppError::bad_request(
                    "Unsupported status code",
                    json!({ "status_code": code, "allowed": RedirectStatus::ALLOWED }),
                )
            })?,
        };

        let (from, to) = match input.match_type {
            MatchType::Regex => (from.to_string(), to.to_string()),
            MatchType::Exact | MatchType::Wildcard => (
                format_rule_path(from, self.trailing_slash),
                format_rule_path(to, self.trailing_slash),
            ),
        };

        CompiledPattern::compile(input.match_type, &from, None).map_err(|e| {
            AppError::bad_request(
                "Invalid source pattern",
                json!({ "field": "from", "reason": e.to_string() }),
            )
        })?;

        let note = input
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let saved = match input.id {
            Some(id) => {
                let changes = RuleChanges {
                    from,
                    to,
                    enabled: input.enabled,
                    status_code: status.code(),
                    match_type: input.match_type,
                    note,
                    modified: Utc::now(),
                };
                self.rules.update(&id, changes).await?
            }
            None => {
                let new_rule = NewRule {
                    id: generate_rule_id(),
                    from,
                    to,
                    enabled: input.enabled,
                    status_code: status.code(),
                    match_type: input.match_type,
                    note,
                    created: Utc::now(),
                };
                self.rules.insert(new_rule).await?
            }
        };

        info!(rule_id = %saved.id, from = %saved.from, to = %saved.to, "Rule saved");
        Ok(saved)
    }

    async fn rebuild_cache(&self) {
        if let Err(e) = self.cache.rebuild().await {
            warn!(error = %e, "Redirect index rebuild failed");
            self.cache.invalidate().await;
        }
    }
}

fn rule_not_found(id: &str) -> AppError {
    AppError::not_found("Rule not found", json!({ "id": id }))
}
