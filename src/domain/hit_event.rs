//! Hit event model for asynchronous hit counting.

use chrono::{DateTime, Utc};

/// A successful dispatch-time match of a rule.
///
/// Sent from the dispatcher to [`crate::application::hit_worker::run_hit_worker`]
/// over a bounded channel so the redirect response never waits on the
/// counter write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitEvent {
    pub rule_id: String,
    pub hit_at: DateTime<Utc>,
    /// Request path that triggered the match, for logging.
    pub path: String,
}

impl HitEvent {
    /// Creates a hit event stamped with the current time.
    pub fn new(rule_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            hit_at: Utc::now(),
            path: path.into(),
        }
    }
}
