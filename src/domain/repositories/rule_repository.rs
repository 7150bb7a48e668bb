//! Repository trait for redirect rule data access.

use crate::domain::entities::{NewRule, RedirectRule, RuleChanges, RuleTestResult};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for the authoritative rule store.
///
/// Rules are returned in store order (ascending insertion position), which is
/// the order the dispatcher evaluates them in.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRuleRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryRuleRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_rule.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Returns every rule in store order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list(&self) -> Result<Vec<RedirectRule>, AppError>;

    /// Finds a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find(&self, id: &str) -> Result<Option<RedirectRule>, AppError>;

    /// Inserts a new rule at the end of the store order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the id already exists.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn insert(&self, new_rule: NewRule) -> Result<RedirectRule, AppError>;

    /// Applies edits to an existing rule. Hit counters are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no rule has this id.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update(&self, id: &str, changes: RuleChanges) -> Result<RedirectRule, AppError>;

    /// Removes a rule. Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Atomically increments `hits` by one and sets `last_hit`.
    ///
    /// Returns `Ok(false)` if the rule no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record_hit(&self, id: &str, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Stores the latest live-test outcome for a rule.
    ///
    /// Returns `Ok(false)` if the rule does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record_test(&self, id: &str, result: RuleTestResult) -> Result<bool, AppError>;

    /// Counts stored rules.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn count(&self) -> Result<i64, AppError>;
}
