//! Background consumer of dispatch hits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_retry::{
    Retry,
    strategy::{ExponentialBackoff, jitter},
};
use tracing::{debug, warn};

use crate::application::services::RedirectCacheService;
use crate::domain::hit_event::HitEvent;
use crate::domain::repositories::RuleRepository;

/// Drains hit events until every sender is dropped.
///
/// Each event increments the rule's counter through a single atomic store
/// update, retried with jittered exponential backoff. A successful write
/// invalidates the redirect index so its hit counts follow the store.
///
/// Counting is best-effort. The increment is not idempotent, so an update
/// that commits but whose reply is lost is counted again on retry. A hit that
/// still fails after the retries is dropped and the worker moves on.
pub async fn run_hit_worker(
    mut rx: mpsc::Receiver<HitEvent>,
    rules: Arc<dyn RuleRepository>,
    cache: Arc<RedirectCacheService>,
) {
    while let Some(ev) = rx.recv().await {
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_millis(500))
            .map(jitter)
            .take(3);

        let outcome = Retry::spawn(strategy, || rules.record_hit(&ev.rule_id, ev.hit_at)).await;

        match outcome {
            Ok(true) => {
                metrics::counter!("redirect_hits_recorded_total").increment(1);
                debug!(rule_id = %ev.rule_id, path = %ev.path, "Hit recorded");
                cache.invalidate().await;
            }
            Ok(false) => {
                debug!(rule_id = %ev.rule_id, "Hit for a rule that no longer exists");
            }
            Err(e) => {
                metrics::counter!("redirect_hits_dropped_total").increment(1);
                warn!(rule_id = %ev.rule_id, error = %e, "Failed to record hit");
            }
        }
    }

    debug!("Hit worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockRuleRepository;
    use crate::error::AppError;
    use crate::infrastructure::cache::{CacheService, MemoryCache};
    use crate::application::services::redirect_cache_service::REDIRECT_CACHE_KEY;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_service(
        repo: Arc<dyn RuleRepository>,
        cache: Arc<MemoryCache>,
    ) -> Arc<RedirectCacheService> {
        Arc::new(RedirectCacheService::new(repo, cache, 60, None))
    }

    #[tokio::test]
    async fn test_worker_records_each_hit_and_invalidates() {
        let mut repo = MockRuleRepository::new();
        repo.expect_record_hit()
            .withf(|id, _| id == "r_1")
            .times(2)
            .returning(|_, _| Ok(true));
        let repo: Arc<dyn RuleRepository> = Arc::new(repo);

        let memory = Arc::new(MemoryCache::default());
        memory.set(REDIRECT_CACHE_KEY, "{}", None).await.unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(HitEvent::new("r_1", "/a")).await.unwrap();
        tx.send(HitEvent::new("r_1", "/a")).await.unwrap();
        drop(tx);

        run_hit_worker(rx, repo.clone(), cache_service(repo, memory.clone())).await;

        assert_eq!(memory.get(REDIRECT_CACHE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_worker_retries_transient_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let mut repo = MockRuleRepository::new();
        repo.expect_record_hit().returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::internal("Database error", json!({})))
            } else {
                Ok(true)
            }
        });
        let repo: Arc<dyn RuleRepository> = Arc::new(repo);

        let (tx, rx) = mpsc::channel(1);
        tx.send(HitEvent::new("r_1", "/a")).await.unwrap();
        drop(tx);

        run_hit_worker(
            rx,
            repo.clone(),
            cache_service(repo, Arc::new(MemoryCache::default())),
        )
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_worker_gives_up_after_retries() {
        let mut repo = MockRuleRepository::new();
        repo.expect_record_hit()
            .times(4)
            .returning(|_, _| Err(AppError::internal("Database error", json!({}))));
        let repo: Arc<dyn RuleRepository> = Arc::new(repo);

        let (tx, rx) = mpsc::channel(1);
        tx.send(HitEvent::new("r_1", "/a")).await.unwrap();
        drop(tx);

        run_hit_worker(
            rx,
            repo.clone(),
            cache_service(repo, Arc::new(MemoryCache::default())),
        )
        .await;
    }

    #[tokio::test]
    async fn test_worker_continues_after_dropped_hit() {
        let mut repo = MockRuleRepository::new();
        repo.expect_record_hit()
            .withf(|id, _| id == "r_bad")
            .times(4)
            .returning(|_, _| Err(AppError::internal("Database error", json!({}))));
        repo.expect_record_hit()
            .withf(|id, _| id == "r_good")
            .times(1)
            .returning(|_, _| Ok(true));
        let repo: Arc<dyn RuleRepository> = Arc::new(repo);

        let (tx, rx) = mpsc::channel(2);
        tx.send(HitEvent::new("r_bad", "/a")).await.unwrap();
        tx.send(HitEvent::new("r_good", "/b")).await.unwrap();
        drop(tx);

        run_hit_worker(
            rx,
            repo.clone(),
            cache_service(repo, Arc::new(MemoryCache::default())),
        )
        .await;
    }
}
