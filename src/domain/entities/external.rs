//! Read-only redirect data collected from external sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A redirect defined outside this service, normalized for display.
///
/// Never enforced and never merged into the rule store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRedirectRecord {
    pub from: String,
    pub to: String,
    pub status: u16,
    /// Name of the originating source (plugin table or file).
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<i64>,
}

impl ExternalRedirectRecord {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        status: u16,
        source: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            status,
            source: source.into(),
            hits: None,
        }
    }

    pub fn with_hits(mut self, hits: i64) -> Self {
        self.hits = Some(hits);
        self
    }
}

/// Per-source outcome of a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub found: usize,
    pub available: bool,
}

/// Aggregated result of scanning every external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub results: Vec<ExternalRedirectRecord>,
    pub sources_checked: BTreeMap<String, SourceStatus>,
    pub scanned_at: DateTime<Utc>,
}

/// Annotation for a local path discovered by the last external scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCacheEntry {
    pub path: String,
    pub redirects_to: String,
    pub status: u16,
    pub source: String,
}
