//! Derived lookup index over the enabled redirect rules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::rule::RedirectRule;
use crate::utils::path_normalizer::{cache_key, normalize_path};

/// Entry of the `from` index: where a path redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingRef {
    pub rule_id: String,
    pub to: String,
    pub hits: i64,
}

/// Entry of the `to` index: a rule that redirects into a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRef {
    pub rule_id: String,
    pub from: String,
    pub hits: i64,
}

/// Index built from the rule store.
///
/// Never the source of truth: it can be dropped and rebuilt from the store at
/// any time. Only enabled rules are represented. When two rules share a
/// normalized `from`, the earlier one (in store order) owns the entry, matching
/// first-match dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectCache {
    pub from: HashMap<String, OutgoingRef>,
    pub to: HashMap<String, Vec<IncomingRef>>,
}

impl RedirectCache {
    /// Builds both indexes from rules given in store order.
    pub fn build(rules: &[RedirectRule], site_host: Option<&str>) -> Self {
        let mut cache = Self::default();

        for rule in rules.iter().filter(|r| r.is_dispatchable()) {
            let from_key = cache_key(&rule.from, site_host);
            let to_key = cache_key(&rule.to, site_host);

            cache.from.entry(from_key).or_insert_with(|| OutgoingRef {
                rule_id: rule.id.clone(),
                to: rule.to.clone(),
                hits: rule.hits,
            });

            cache.to.entry(to_key).or_default().push(IncomingRef {
                rule_id: rule.id.clone(),
                from: rule.from.clone(),
                hits: rule.hits,
            });
        }

        cache
    }

    pub fn is_redirected(&self, path: &str) -> Option<&OutgoingRef> {
        self.from.get(&normalize_path(path))
    }

    pub fn incoming_for(&self, path: &str) -> &[IncomingRef] {
        self.to
            .get(&normalize_path(path))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty()
    }
}
