//! A fully in-memory [`RuleRepository`], holding rules in RAM only.
//!
//! Backs the handler and service tests, which run without a database.
//! Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{NewRule, RedirectRule, RuleChanges, RuleTestResult};
use crate::domain::repositories::RuleRepository;
use crate::error::AppError;

#[derive(Debug, Default)]
pub struct MemoryRuleRepository {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<RedirectRule>,
    next_position: i64,
}

impl MemoryRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer leaves the rule list intact, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl RuleRepository for MemoryRuleRepository {
    async fn list(&self) -> Result<Vec<RedirectRule>, AppError> {
        let state = self.read();
        Ok(state.rules.clone())
    }

    async fn find(&self, id: &str) -> Result<Option<RedirectRule>, AppError> {
        let state = self.read();
        Ok(state.rules.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, new_rule: NewRule) -> Result<RedirectRule, AppError> {
        let mut state = self.write();

        if state.rules.iter().any(|r| r.id == new_rule.id) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "redirect_rules_pkey" }),
            ));
        }

        state.next_position += 1;
        let rule = RedirectRule {
            id: new_rule.id,
            from: new_rule.from,
            to: new_rule.to,
            enabled: new_rule.enabled,
            status_code: i32::from(new_rule.status_code),
            match_type: new_rule.match_type,
            hits: 0,
            last_hit: None,
            created: new_rule.created,
            modified: new_rule.created,
            note: new_rule.note,
            position: state.next_position,
            last_test: None,
        };
        state.rules.push(rule.clone());

        Ok(rule)
    }

    async fn update(&self, id: &str, changes: RuleChanges) -> Result<RedirectRule, AppError> {
        let mut state = self.write();

        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("Rule not found", json!({ "id": id })))?;

        rule.from = changes.from;
        rule.to = changes.to;
        rule.enabled = changes.enabled;
        rule.status_code = i32::from(changes.status_code);
        rule.match_type = changes.match_type;
        rule.note = changes.note;
        rule.modified = changes.modified;

        Ok(rule.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.write();
        let before = state.rules.len();
        state.rules.retain(|r| r.id != id);
        Ok(state.rules.len() != before)
    }

    async fn record_hit(&self, id: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut state = self.write();
        match state.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.hits += 1;
                rule.last_hit = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_test(&self, id: &str, result: RuleTestResult) -> Result<bool, AppError> {
        let mut state = self.write();
        match state.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.last_test = Some(result);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<i64, AppError> {
        let state = self.read();
        Ok(state.rules.len() as i64)
    }
}
