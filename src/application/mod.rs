//! Application layer services implementing business logic.
//!
//! Services consume domain traits (`RuleRepository`, `RedirectSource`) and the
//! cache backend, and provide the API used by HTTP handlers, the dispatch
//! middleware and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::rule_service::RuleService`] - Rule validation and persistence
//! - [`services::redirect_cache_service::RedirectCacheService`] - Cached redirect index
//! - [`services::dispatch_service::DispatchService`] - Request-time matching
//! - [`services::scan_service::ScanService`] - External redirect scanning
//! - [`services::tester_service::TesterService`] - Live HTTP testing
//! - [`services::auth_service::AuthService`] - Admin token authentication

pub mod hit_worker;
pub mod services;
