//! HTTP middleware for request processing and protection.
//!
//! Provides request-time redirect dispatch, authentication, rate limiting,
//! and observability middleware.

pub mod auth;
pub mod dispatch;
pub mod rate_limit;
pub mod tracing;
