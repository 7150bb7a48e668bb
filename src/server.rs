//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, external sources, the hit
//! worker, and the Axum server lifecycle.

use crate::application::hit_worker::run_hit_worker;
use crate::config::Config;
use crate::domain::sources::RedirectSource;
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache};
use crate::infrastructure::persistence::PgRuleRepository;
use crate::infrastructure::sources::{
    HtaccessSource, RankMathTableSource, RedirectionTableSource, Simple301OptionSource,
};
use crate::routes::app_router;
use crate::state::{AppState, ServiceSettings};

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or in-memory fallback)
/// - External redirect sources
/// - Background hit worker
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let cache = connect_cache(&config).await;

    let pool = Arc::new(pool);
    let sources = build_sources(&config, &pool);

    let (hit_tx, hit_rx) = mpsc::channel(config.hit_queue_capacity);

    let settings = ServiceSettings::from(&config);
    let state = AppState::new(
        Arc::new(PgRuleRepository::new(pool.clone())),
        cache,
        sources,
        hit_tx,
        &settings,
    )
    .context("Failed to build application state")?;
    tracing::info!(
        sources = ?state.scan_service.source_names(),
        "External redirect sources configured"
    );

    tokio::spawn(run_hit_worker(
        hit_rx,
        state.rules.clone(),
        state.redirect_cache.clone(),
    ));
    tracing::info!("Hit worker started");

    if let Err(e) = state.redirect_cache.rebuild().await {
        tracing::warn!(error = %e, "Initial redirect cache build failed");
    }

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let ttl = config.redirect_cache_ttl_seconds;

    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, ttl).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-memory cache.", e);
            }
        }
    } else {
        tracing::info!("Cache in memory (REDIS_URL not set)");
    }

    Arc::new(MemoryCache::new(ttl))
}

/// Sources are probed at scan time; missing tables or files only mark them unavailable.
pub fn build_sources(config: &Config, pool: &Arc<PgPool>) -> Vec<Arc<dyn RedirectSource>> {
    let prefix = config.external_table_prefix.as_str();

    vec![
        Arc::new(RedirectionTableSource::new(pool.clone(), prefix)),
        Arc::new(RankMathTableSource::new(pool.clone(), prefix)),
        Arc::new(Simple301OptionSource::new(pool.clone(), prefix)),
        Arc::new(HtaccessSource::new(config.htaccess_path.clone())),
    ]
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
