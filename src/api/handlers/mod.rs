//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod not_found;
pub mod rules;
pub mod scan;
pub mod tester;

pub use health::health_handler;
pub use not_found::not_found_handler;
pub use rules::{
    delete_rule_handler, import_rules_handler, incoming_handler, list_rules_handler,
    record_test_result_handler, save_rule_handler,
};
pub use scan::{annotation_handler, cached_scan_handler, clear_scan_handler, run_scan_handler};
pub use tester::{chain_handler, test_url_handler};
