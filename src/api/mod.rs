//! HTTP surface: the admin REST API and the request-time redirect layer.
//!
//! - [`dto`] - Request/response bodies
//! - [`handlers`] - Admin API, health and fallback handlers
//! - [`middleware`] - Redirect dispatch, authentication, rate limiting, tracing
//! - [`routes`] - Admin API route table

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
