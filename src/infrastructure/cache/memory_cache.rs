//! In-process cache implementation.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// A cache held in process memory with per-entry expiry.
///
/// Used when Redis is not configured or unreachable at startup, and in tests.
/// Expired entries are dropped lazily on access.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Creates an empty cache with the given default TTL in seconds.
    pub fn new(default_ttl_seconds: u64) -> Self {
        debug!("Using in-memory cache");
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(3600)
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.lock();

        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let ttl = ttl_seconds.map_or(self.default_ttl, Duration::from_secs);

        self.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );

        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
