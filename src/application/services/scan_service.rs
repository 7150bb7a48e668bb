//! Diagnostic scan of redirects defined outside the rule store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{ScanCacheEntry, ScanReport, SourceStatus};
use crate::domain::sources::RedirectSource;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::path_normalizer::normalize_path;

/// Cache key of the last [`ScanReport`].
pub const SCAN_CACHE_KEY: &str = "redirects:scan";

/// Cache key of the RFC 3339 timestamp of the last scan.
pub const SCAN_TIMESTAMP_KEY: &str = "redirects:scan:last_scanned";

/// Aggregates every configured [`RedirectSource`] into one report.
///
/// Results are informational only. Nothing found here is enforced or merged
/// into the rule store.
pub struct ScanService {
    sources: Vec<Arc<dyn RedirectSource>>,
    cache: Arc<dyn CacheService>,
    ttl_seconds: u64,
}

impl ScanService {
    pub fn new(
        sources: Vec<Arc<dyn RedirectSource>>,
        cache: Arc<dyn CacheService>,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            sources,
            cache,
            ttl_seconds,
        }
    }

    /// Names of the configured sources, in scan order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Scans every source and caches the report.
    ///
    /// An absent source is reported with `available: false` and no records.
    /// A source that exists but fails to read is logged and reported the
    /// same way.
    pub async fn scan_all_sources(&self) -> ScanReport {
        let mut results = Vec::new();
        let mut sources_checked = BTreeMap::new();

        for source in &self.sources {
            let name = source.name();

            if !source.is_available().await {
                debug!(source = name, "Source not available");
                sources_checked.insert(name.to_string(), SourceStatus::default());
                continue;
            }

            match source.scan().await {
                Ok(records) => {
                    metrics::counter!("external_scan_records_total", "source" => name)
                        .increment(records.len() as u64);
                    sources_checked.insert(
                        name.to_string(),
                        SourceStatus {
                            found: records.len(),
                            available: true,
                        },
                    );
                    results.extend(records);
                }
                Err(e) => {
                    warn!(source = name, error = %e, "Source scan failed");
                    sources_checked.insert(name.to_string(), SourceStatus::default());
                }
            }
        }

        let report = ScanReport {
            results,
            sources_checked,
            scanned_at: Utc::now(),
        };

        self.store(&report).await;

        info!(found = report.results.len(), "External redirect scan complete");
        report
    }

    /// Returns the last cached report, if any.
    pub async fn cached_scan(&self) -> Option<ScanReport> {
        match self.cache.get(SCAN_CACHE_KEY).await {
            Ok(Some(payload)) => serde_json::from_str(&payload)
                .inspect_err(|e| warn!(error = %e, "Discarding unreadable scan report"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Scan cache error");
                None
            }
        }
    }

    /// Time of the last scan still held in the cache.
    pub async fn last_scanned(&self) -> Option<DateTime<Utc>> {
        let raw = self.cache.get(SCAN_TIMESTAMP_KEY).await.ok().flatten()?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Drops the cached report and its timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the cache backend rejects the delete.
    pub async fn clear_scan_cache(&self) -> Result<(), AppError> {
        for key in [SCAN_CACHE_KEY, SCAN_TIMESTAMP_KEY] {
            self.cache.invalidate(key).await.map_err(|e| {
                AppError::internal(
                    "Failed to clear scan cache",
                    json!({ "key": key, "reason": e.to_string() }),
                )
            })?;
        }
        Ok(())
    }

    /// Looks up what the last scan found for a local path.
    ///
    /// The first record whose normalized `from` equals the normalized path wins.
    pub async fn annotation_for(&self, path: &str) -> Option<ScanCacheEntry> {
        let report = self.cached_scan().await?;
        let wanted = normalize_path(path);

        report
            .results
            .into_iter()
            .find(|r| normalize_path(&r.from) == wanted)
            .map(|r| ScanCacheEntry {
                path: wanted,
                redirects_to: r.to,
                status: r.status,
                source: r.source,
            })
    }

    async fn store(&self, report: &ScanReport) {
        let payload = match serde_json::to_string(report) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize scan report");
                return;
            }
        };

        let ttl = Some(self.ttl_seconds);
        if let Err(e) = self.cache.set(SCAN_CACHE_KEY, &payload, ttl).await {
            warn!(error = %e, "Failed to cache scan report");
        }
        let stamp = report.scanned_at.to_rfc3339();
        if let Err(e) = self.cache.set(SCAN_TIMESTAMP_KEY, &stamp, ttl).await {
            warn!(error = %e, "Failed to cache scan timestamp");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ExternalRedirectRecord;
    use crate::domain::sources::{MockRedirectSource, SourceError};
    use crate::infrastructure::cache::MemoryCache;

    fn source(
        name: &'static str,
        available: bool,
        records: Vec<ExternalRedirectRecord>,
    ) -> Arc<dyn RedirectSource> {
        let mut mock = MockRedirectSource::new();
        mock.expect_name().return_const(name);
        mock.expect_is_available().return_const(available);
        mock.expect_scan().returning(move || Ok(records.clone()));
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_absent_source_reports_unavailable() {
        let service = ScanService::new(
            vec![source("redirection", false, vec![])],
            Arc::new(MemoryCache::default()),
            60,
        );

        let report = service.scan_all_sources().await;

        assert!(report.results.is_empty());
        let status = report.sources_checked["redirection"];
        assert!(!status.available);
        assert_eq!(status.found, 0);
    }

    #[tokio::test]
    async fn test_scan_aggregates_and_caches() {
        let service = ScanService::new(
            vec![
                source(
                    "htaccess",
                    true,
                    vec![ExternalRedirectRecord::new("/a", "/b", 301, "htaccess")],
                ),
                source(
                    "rank_math",
                    true,
                    vec![
                        ExternalRedirectRecord::new("/c", "/d", 302, "rank_math").with_hits(4),
                        ExternalRedirectRecord::new("/e", "/f", 301, "rank_math"),
                    ],
                ),
            ],
            Arc::new(MemoryCache::default()),
            60,
        );

        let report = service.scan_all_sources().await;
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.sources_checked["rank_math"].found, 2);

        let cached = service.cached_scan().await.unwrap();
        assert_eq!(cached, report);
        assert!(service.last_scanned().await.is_some());

        let annotation = service.annotation_for("/C/").await.unwrap();
        assert_eq!(annotation.redirects_to, "/d");
        assert_eq!(annotation.status, 302);
        assert_eq!(annotation.source, "rank_math");
    }

    #[tokio::test]
    async fn test_failing_source_is_unavailable() {
        let mut mock = MockRedirectSource::new();
        mock.expect_name().return_const("simple_301_redirects");
        mock.expect_is_available().return_const(true);
        mock.expect_scan()
            .returning(|| Err(SourceError::Read("bad payload".to_string())));

        let service = ScanService::new(vec![Arc::new(mock)], Arc::new(MemoryCache::default()), 60);

        let report = service.scan_all_sources().await;
        assert!(!report.sources_checked["simple_301_redirects"].available);
    }

    #[tokio::test]
    async fn test_clear_scan_cache() {
        let service = ScanService::new(
            vec![source("htaccess", true, vec![])],
            Arc::new(MemoryCache::default()),
            60,
        );

        service.scan_all_sources().await;
        service.clear_scan_cache().await.unwrap();

        assert!(service.cached_scan().await.is_none());
        assert!(service.last_scanned().await.is_none());
        assert!(service.annotation_for("/a").await.is_none());
    }
}
