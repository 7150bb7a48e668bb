//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `*`            - Any request matching an enabled rule is redirected
//! - `GET /health`  - Health check: DB, cache, hit queue (public)
//! - `/api/*`       - Admin REST API (Bearer token required)
//!
//! Unmatched requests fall through to a JSON `404`.
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Dispatch** - Rule matching before routing
//! - **Rate limiting** - Per-IP token bucket on the admin API
//! - **Authentication** - Bearer token on the admin API

use crate::api;
use crate::api::handlers::{health_handler, not_found_handler};
use crate::api::middleware::{auth, dispatch, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads the client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let api_router = if behind_proxy {
        api_router.layer(rate_limit::proxied_layer())
    } else {
        api_router.layer(rate_limit::layer())
    };

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            dispatch::layer,
        ))
        .with_state(state)
        .layer(tracing::layer())
}
