//! Derived redirect index kept in the cache backend.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{IncomingRef, OutgoingRef, RedirectCache};
use crate::domain::repositories::RuleRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Cache key of the serialized [`RedirectCache`].
pub const REDIRECT_CACHE_KEY: &str = "redirects:map";

/// Maintains the `from`/`to` index over enabled rules.
///
/// The index is stored as one JSON document with a TTL and rebuilt from the
/// rule store whenever it is missing, expired, unreadable, or after a store
/// mutation.
pub struct RedirectCacheService {
    rules: Arc<dyn RuleRepository>,
    cache: Arc<dyn CacheService>,
    ttl_seconds: u64,
    site_host: Option<String>,
}

impl RedirectCacheService {
    /// Creates a new cache service.
    ///
    /// # Arguments
    ///
    /// - `rules` - authoritative rule store
    /// - `cache` - backend holding the serialized index
    /// - `ttl_seconds` - index lifetime (24 hours by default)
    /// - `site_host` - host of the site, so absolute site URLs index by path
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        cache: Arc<dyn CacheService>,
        ttl_seconds: u64,
        site_host: Option<String>,
    ) -> Self {
        Self {
            rules,
            cache,
            ttl_seconds,
            site_host,
        }
    }

    /// Returns the cached index, rebuilding it on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the rebuild cannot read the rule store.
    pub async fn get_map(&self) -> Result<RedirectCache, AppError> {
        match self.cache.get(REDIRECT_CACHE_KEY).await {
            Ok(Some(payload)) => match serde_json::from_str::<RedirectCache>(&payload) {
                Ok(map) => {
                    debug!("Redirect index cache HIT");
                    return Ok(map);
                }
                Err(e) => warn!(error = %e, "Discarding unreadable redirect index"),
            },
            Ok(None) => debug!("Redirect index cache MISS"),
            Err(e) => warn!(error = %e, "Redirect index cache error"),
        }

        self.rebuild().await
    }

    /// Rebuilds the index from the rule store and overwrites the cached copy.
    ///
    /// A failure to write the cache is logged; the freshly built index is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the rule store cannot be read.
    pub async fn rebuild(&self) -> Result<RedirectCache, AppError> {
        let rules = self.rules.list().await?;
        let map = RedirectCache::build(&rules, self.site_host.as_deref());

        let payload = serde_json::to_string(&map).map_err(|e| {
            AppError::internal(
                "Failed to serialize redirect index",
                json!({ "reason": e.to_string() }),
            )
        })?;

        if let Err(e) = self
            .cache
            .set(REDIRECT_CACHE_KEY, &payload, Some(self.ttl_seconds))
            .await
        {
            warn!(error = %e, "Failed to store redirect index");
        }

        debug!(entries = map.from.len(), "Redirect index rebuilt");
        Ok(map)
    }

    /// Looks up where a path redirects to, if anywhere.
    ///
    /// # Errors
    ///
    /// See [`Self::get_map`].
    pub async fn is_redirected(&self, path: &str) -> Result<Option<OutgoingRef>, AppError> {
        Ok(self.get_map().await?.is_redirected(path).cloned())
    }

    /// Lists the rules redirecting into a path.
    ///
    /// # Errors
    ///
    /// See [`Self::get_map`].
    pub async fn incoming_for(&self, path: &str) -> Result<Vec<IncomingRef>, AppError> {
        Ok(self.get_map().await?.incoming_for(path).to_vec())
    }

    /// Drops the cached index so the next read rebuilds it.
    pub async fn invalidate(&self) {
        if let Err(e) = self.cache.invalidate(REDIRECT_CACHE_KEY).await {
            warn!(error = %e, "Failed to invalidate redirect index");
        }
    }
}
