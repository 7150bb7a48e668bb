//! PostgreSQL implementation of the rule repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewRule, RedirectRule, RuleChanges, RuleTestResult};
use crate::domain::repositories::RuleRepository;
use crate::error::AppError;

const RULE_COLUMNS: &str = r#"
    id, position, from_path, to_path, enabled, status_code, match_type,
    hits, last_hit, created, modified, note,
    last_test_status, last_test_location, last_test_redirected, last_tested_at
"#;

#[derive(Debug, FromRow)]
struct RuleRow {
    id: String,
    position: i64,
    from_path: String,
    to_path: String,
    enabled: bool,
    status_code: i32,
    match_type: String,
    hits: i64,
    last_hit: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    note: Option<String>,
    last_test_status: Option<i32>,
    last_test_location: Option<String>,
    last_test_redirected: Option<bool>,
    last_tested_at: Option<DateTime<Utc>>,
}

impl From<RuleRow> for RedirectRule {
    fn from(row: RuleRow) -> Self {
        let last_test = row.last_tested_at.map(|tested_at| RuleTestResult {
            status_code: row.last_test_status.and_then(|s| u16::try_from(s).ok()),
            location: row.last_test_location,
            redirected: row.last_test_redirected.unwrap_or(false),
            tested_at,
        });

        RedirectRule {
            id: row.id,
            from: row.from_path,
            to: row.to_path,
            enabled: row.enabled,
            status_code: row.status_code,
            match_type: row.match_type.parse().unwrap_or_default(),
            hits: row.hits,
            last_hit: row.last_hit,
            created: row.created,
            modified: row.modified,
            note: row.note,
            position: row.position,
            last_test,
        }
    }
}

/// PostgreSQL repository for redirect rules.
///
/// Rules live in `redirect_rules`, one row per rule. Store order is the
/// `position` sequence assigned on insert.
pub struct PgRuleRepository {
    pool: Arc<PgPool>,
}

impl PgRuleRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleRepository for PgRuleRepository {
    async fn list(&self) -> Result<Vec<RedirectRule>, AppError> {
        let sql = format!(
            "SELECT {} FROM redirect_rules ORDER BY position ASC",
            RULE_COLUMNS
        );

        let rows = sqlx::query_as::<_, RuleRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(RedirectRule::from).collect())
    }

    async fn find(&self, id: &str) -> Result<Option<RedirectRule>, AppError> {
        let sql = format!("SELECT {} FROM redirect_rules WHERE id = $1", RULE_COLUMNS);

        let row = sqlx::query_as::<_, RuleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(RedirectRule::from))
    }

    async fn insert(&self, new_rule: NewRule) -> Result<RedirectRule, AppError> {
        let sql = format!(
            r#"
            INSERT INTO redirect_rules
                (id, from_path, to_path, enabled, status_code, match_type, note, created, modified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            RULE_COLUMNS
        );

        let row = sqlx::query_as::<_, RuleRow>(&sql)
            .bind(&new_rule.id)
            .bind(&new_rule.from)
            .bind(&new_rule.to)
            .bind(new_rule.enabled)
            .bind(i32::from(new_rule.status_code))
            .bind(new_rule.match_type.as_str())
            .bind(&new_rule.note)
            .bind(new_rule.created)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn update(&self, id: &str, changes: RuleChanges) -> Result<RedirectRule, AppError> {
        let sql = format!(
            r#"
            UPDATE redirect_rules
            SET from_path = $2, to_path = $3, enabled = $4, status_code = $5,
                match_type = $6, note = $7, modified = $8
            WHERE id = $1
            RETURNING {}
            "#,
            RULE_COLUMNS
        );

        let row = sqlx::query_as::<_, RuleRow>(&sql)
            .bind(id)
            .bind(&changes.from)
            .bind(&changes.to)
            .bind(changes.enabled)
            .bind(i32::from(changes.status_code))
            .bind(changes.match_type.as_str())
            .bind(&changes.note)
            .bind(changes.modified)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(RedirectRule::from)
            .ok_or_else(|| AppError::not_found("Rule not found", json!({ "id": id })))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM redirect_rules WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_hit(&self, id: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE redirect_rules
            SET hits = hits + 1, last_hit = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_test(&self, id: &str, result: RuleTestResult) -> Result<bool, AppError> {
        let outcome = sqlx::query(
            r#"
            UPDATE redirect_rules
            SET last_test_status = $2, last_test_location = $3,
                last_test_redirected = $4, last_tested_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(result.status_code.map(i32::from))
        .bind(&result.location)
        .bind(result.redirected)
        .bind(result.tested_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(outcome.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redirect_rules")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MatchType;

    #[test]
    fn test_row_conversion_maps_last_test() {
        let now = Utc::now();
        let row = RuleRow {
            id: "r_1".to_string(),
            position: 7,
            from_path: "/a".to_string(),
            to_path: "/b".to_string(),
            enabled: true,
            status_code: 302,
            match_type: "wildcard".to_string(),
            hits: 5,
            last_hit: Some(now),
            created: now,
            modified: now,
            note: None,
            last_test_status: Some(301),
            last_test_location: Some("/b".to_string()),
            last_test_redirected: Some(true),
            last_tested_at: Some(now),
        };

        let rule = RedirectRule::from(row);

        assert_eq!(rule.match_type, MatchType::Wildcard);
        assert_eq!(rule.position, 7);
        let test = rule.last_test.unwrap();
        assert_eq!(test.status_code, Some(301));
        assert!(test.redirected);
    }

    #[test]
    fn test_unknown_match_type_reads_as_exact() {
        let now = Utc::now();
        let row = RuleRow {
            id: "r_1".to_string(),
            position: 1,
            from_path: "/a".to_string(),
            to_path: "/b".to_string(),
            enabled: true,
            status_code: 301,
            match_type: "glob".to_string(),
            hits: 0,
            last_hit: None,
            created: now,
            modified: now,
            note: None,
            last_test_status: None,
            last_test_location: None,
            last_test_redirected: None,
            last_tested_at: None,
        };

        let rule = RedirectRule::from(row);
        assert_eq!(rule.match_type, MatchType::Exact);
        assert!(rule.last_test.is_none());
    }
}
