//! Admin API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    annotation_handler, cached_scan_handler, chain_handler, clear_scan_handler,
    delete_rule_handler, import_rules_handler, incoming_handler, list_rules_handler,
    record_test_result_handler, run_scan_handler, save_rule_handler, test_url_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /rules`                  - List rules in evaluation order
/// - `POST   /rules`                  - Create a rule, or update it when `id` is given
/// - `POST   /rules/import`           - Bulk import `from,to[,note]` lines
/// - `GET    /rules/incoming?path=`   - Redirect status of a path and rules pointing at it
/// - `DELETE /rules/{id}`             - Delete a rule
/// - `POST   /rules/{id}/test-result` - Store the last live test outcome of a rule
/// - `POST   /scan`                   - Scan external sources now
/// - `GET    /scan`                   - Last cached scan report
/// - `DELETE /scan`                   - Drop the cached scan report
/// - `GET    /scan/annotation?path=`  - External redirect found for a path
/// - `POST   /test`                   - Probe a site path once
/// - `POST   /test/chain`             - Follow a redirect chain
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/rules", get(list_rules_handler).post(save_rule_handler))
        .route("/rules/import", post(import_rules_handler))
        .route("/rules/incoming", get(incoming_handler))
        .route("/rules/{id}", delete(delete_rule_handler))
        .route("/rules/{id}/test-result", post(record_test_result_handler))
        .route(
            "/scan",
            post(run_scan_handler)
                .get(cached_scan_handler)
                .delete(clear_scan_handler),
        )
        .route("/scan/annotation", get(annotation_handler))
        .route("/test", post(test_url_handler))
        .route("/test/chain", post(chain_handler))
}
