//! Fallback for paths no rule and no route claims.

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// Returns `404 Not Found` in the standard error envelope.
pub async fn not_found_handler(uri: Uri) -> AppError {
    AppError::not_found("Not found", json!({ "path": uri.path() }))
}
