//! Request-time redirect resolution.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use crate::domain::entities::{RedirectRule, RedirectStatus};
use crate::domain::hit_event::HitEvent;
use crate::domain::matcher::{PatternCache, RequestTarget, build_location};
use crate::domain::repositories::RuleRepository;
use crate::error::AppError;

/// A rule matched the request: where to send the client and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    pub rule_id: String,
    pub location: String,
    pub status: RedirectStatus,
}

/// Matches incoming request URIs against the live rule store.
///
/// Rules are read from the store on every request and walked in store order;
/// the first match wins. Compiled patterns are memoized in a [`PatternCache`].
pub struct DispatchService {
    rules: Arc<dyn RuleRepository>,
    patterns: PatternCache,
    site_url: String,
    hits: mpsc::Sender<HitEvent>,
}

impl DispatchService {
    /// Creates a new dispatcher.
    ///
    /// # Arguments
    ///
    /// - `rules` - authoritative rule store
    /// - `site_url` - base URL relative targets are resolved against
    /// - `site_host` - host of `site_url`, for rules written as absolute site URLs
    /// - `hits` - queue drained by the hit worker
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        site_url: String,
        site_host: Option<String>,
        hits: mpsc::Sender<HitEvent>,
    ) -> Self {
        Self {
            rules,
            patterns: PatternCache::new(site_host),
            site_url,
            hits,
        }
    }

    /// Resolves a request and records a hit for the matching rule.
    ///
    /// Never fails: a store read error is logged and the request is left
    /// unredirected. A full or closed hit queue is logged and counted but
    /// does not hold up the redirect.
    pub async fn dispatch(&self, raw_uri: &str) -> Option<RedirectDecision> {
        let decision = match self.resolve(raw_uri).await {
            Ok(decision) => decision?,
            Err(e) => {
                error!(error = %e, uri = %raw_uri, "Rule store unavailable, skipping dispatch");
                return None;
            }
        };

        let event = HitEvent::new(decision.rule_id.clone(), raw_uri);
        match self.hits.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(ev)) => {
                metrics::counter!("redirect_hits_dropped_total").increment(1);
                warn!(rule_id = %ev.rule_id, "Hit queue full, dropping hit");
            }
            Err(TrySendError::Closed(ev)) => {
                metrics::counter!("redirect_hits_dropped_total").increment(1);
                warn!(rule_id = %ev.rule_id, "Hit queue closed, dropping hit");
            }
        }

        metrics::counter!(
            "redirects_dispatched_total",
            "status" => decision.status.code().to_string()
        )
        .increment(1);

        Some(decision)
    }

    /// Resolves a request without recording a hit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the rule store cannot be read.
    pub async fn resolve(&self, raw_uri: &str) -> Result<Option<RedirectDecision>, AppError> {
        let rules = self.rules.list().await?;
        Ok(self.evaluate(&rules, &RequestTarget::new(raw_uri)))
    }

    /// Walks `rules` in order and returns the first match.
    pub fn evaluate(
        &self,
        rules: &[RedirectRule],
        target: &RequestTarget,
    ) -> Option<RedirectDecision> {
        for rule in rules.iter().filter(|r| r.is_dispatchable()) {
            let pattern = match self.patterns.get(rule) {
                Ok(pattern) => pattern,
                Err(e) => {
                    debug!(rule_id = %rule.id, error = %e, "Skipping rule with invalid pattern");
                    continue;
                }
            };

            if let Some(captures) = pattern.matches(target) {
                let location = build_location(&rule.to, &captures, target, &self.site_url);
                debug!(rule_id = %rule.id, from = %target.raw_uri, to = %location, "Rule matched");

                return Some(RedirectDecision {
                    rule_id: rule.id.clone(),
                    location,
                    status: rule.redirect_status(),
                });
            }
        }

        None
    }
}
