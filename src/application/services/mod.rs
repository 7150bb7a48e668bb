//! Business logic services for the application layer.

pub mod auth_service;
pub mod dispatch_service;
pub mod redirect_cache_service;
pub mod rule_service;
pub mod scan_service;
pub mod tester_service;

pub use auth_service::AuthService;
pub use dispatch_service::{DispatchService, RedirectDecision};
pub use redirect_cache_service::RedirectCacheService;
pub use rule_service::{ImportSummary, RuleService};
pub use scan_service::ScanService;
pub use tester_service::{ChainHop, ChainReport, TestOutcome, TesterError, TesterService};
