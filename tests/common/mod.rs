#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum_test::{TestRequest, TestServer};
use redirect_manager::domain::entities::ExternalRedirectRecord;
use redirect_manager::domain::hit_event::HitEvent;
use redirect_manager::domain::sources::{RedirectSource, SourceError};
use redirect_manager::infrastructure::cache::MemoryCache;
use redirect_manager::infrastructure::persistence::MemoryRuleRepository;
use redirect_manager::routes::app_router;
use redirect_manager::state::{AppState, ServiceSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const SITE_URL: &str = "https://site.test";

pub fn test_settings(site_url: &str) -> ServiceSettings {
    ServiceSettings {
        site_url: site_url.to_string(),
        site_host: url::Url::parse(site_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string)),
        trailing_slash: true,
        admin_token: ADMIN_TOKEN.to_string(),
        redirect_cache_ttl_seconds: 3600,
        scan_cache_ttl_seconds: 3600,
        tester_timeout: Duration::from_secs(5),
    }
}

pub fn create_test_state_with(
    site_url: &str,
    sources: Vec<Arc<dyn RedirectSource>>,
) -> (AppState, mpsc::Receiver<HitEvent>) {
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::new(
        Arc::new(MemoryRuleRepository::new()),
        Arc::new(MemoryCache::new(3600)),
        sources,
        tx,
        &test_settings(site_url),
    )
    .unwrap();

    (state, rx)
}

pub fn create_test_state() -> (AppState, mpsc::Receiver<HitEvent>) {
    create_test_state_with(SITE_URL, Vec::new())
}

/// Supplies the peer address the rate limiter keys on; the mock transport
/// carries none.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// Full application router, as served in production.
pub fn create_test_server(state: AppState) -> TestServer {
    let app = app_router(state, false).layer(MockConnectInfoLayer);
    TestServer::new(app).unwrap()
}

pub fn admin(request: TestRequest) -> TestRequest {
    request.add_header("Authorization", format!("Bearer {}", ADMIN_TOKEN))
}

/// Source returning fixed records, or failing.
pub struct StaticSource {
    pub name: &'static str,
    pub available: bool,
    pub records: Result<Vec<ExternalRedirectRecord>, String>,
}

#[async_trait]
impl RedirectSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn scan(&self) -> Result<Vec<ExternalRedirectRecord>, SourceError> {
        self.records.clone().map_err(SourceError::Read)
    }
}
