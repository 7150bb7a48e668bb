//! Shared application state injected into handlers and middleware.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::application::services::{
    AuthService, DispatchService, RedirectCacheService, RuleService, ScanService, TesterError,
    TesterService,
};
use crate::config::Config;
use crate::domain::hit_event::HitEvent;
use crate::domain::repositories::RuleRepository;
use crate::domain::sources::RedirectSource;
use crate::infrastructure::cache::CacheService;

/// Service-level settings, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub site_url: String,
    pub site_host: Option<String>,
    pub trailing_slash: bool,
    pub admin_token: String,
    pub redirect_cache_ttl_seconds: u64,
    pub scan_cache_ttl_seconds: u64,
    pub tester_timeout: Duration,
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            site_url: config.site_url.clone(),
            site_host: config.site_host(),
            trailing_slash: config.trailing_slash,
            admin_token: config.admin_token.clone(),
            redirect_cache_ttl_seconds: config.redirect_cache_ttl_seconds,
            scan_cache_ttl_seconds: config.scan_cache_ttl_seconds,
            tester_timeout: Duration::from_secs(config.tester_timeout_seconds),
        }
    }
}

/// Services shared by every request.
///
/// Built once at startup; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<dyn RuleRepository>,
    pub cache: Arc<dyn CacheService>,
    pub rule_service: Arc<RuleService>,
    pub redirect_cache: Arc<RedirectCacheService>,
    pub dispatch_service: Arc<DispatchService>,
    pub scan_service: Arc<ScanService>,
    pub tester_service: Arc<TesterService>,
    pub auth_service: Arc<AuthService>,
    pub hit_sender: mpsc::Sender<HitEvent>,
}

impl AppState {
    /// Wires the services together.
    ///
    /// The receiving end of `hit_sender` must be handed to
    /// [`crate::application::hit_worker::run_hit_worker`] by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError`] if the HTTP client for the live tester cannot be built.
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        cache: Arc<dyn CacheService>,
        sources: Vec<Arc<dyn RedirectSource>>,
        hit_sender: mpsc::Sender<HitEvent>,
        settings: &ServiceSettings,
    ) -> Result<Self, TesterError> {
        let redirect_cache = Arc::new(RedirectCacheService::new(
            rules.clone(),
            cache.clone(),
            settings.redirect_cache_ttl_seconds,
            settings.site_host.clone(),
        ));

        let rule_service = Arc::new(RuleService::new(
            rules.clone(),
            redirect_cache.clone(),
            settings.trailing_slash,
        ));

        let dispatch_service = Arc::new(DispatchService::new(
            rules.clone(),
            settings.site_url.clone(),
            settings.site_host.clone(),
            hit_sender.clone(),
        ));

        let scan_service = Arc::new(ScanService::new(
            sources,
            cache.clone(),
            settings.scan_cache_ttl_seconds,
        ));

        let tester_service = Arc::new(TesterService::new(
            settings.site_url.clone(),
            settings.tester_timeout,
            dispatch_service.clone(),
        )?);

        Ok(Self {
            rules,
            cache,
            rule_service,
            redirect_cache,
            dispatch_service,
            scan_service,
            tester_service,
            auth_service: Arc::new(AuthService::new(&settings.admin_token)),
            hit_sender,
        })
    }
}
