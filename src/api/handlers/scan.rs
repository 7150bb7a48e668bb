//! Handlers for the external redirect scanner.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::api::dto::rules::PathQuery;
use crate::api::dto::scan::{AnnotationResponse, CachedScanResponse};
use crate::domain::entities::ScanReport;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::path_normalizer::normalize_path;

/// Scans every external source now.
///
/// # Endpoint
///
/// `POST /api/scan`
///
/// Absent sources are listed in `sources_checked` with `available: false`.
pub async fn run_scan_handler(State(state): State<AppState>) -> Json<ScanReport> {
    Json(state.scan_service.scan_all_sources().await)
}

/// Returns the last cached scan, if still held.
///
/// # Endpoint
///
/// `GET /api/scan`
pub async fn cached_scan_handler(State(state): State<AppState>) -> Json<CachedScanResponse> {
    Json(CachedScanResponse {
        last_scanned: state.scan_service.last_scanned().await,
        report: state.scan_service.cached_scan().await,
    })
}

/// `DELETE /api/scan`
pub async fn clear_scan_handler(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.scan_service.clear_scan_cache().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/scan/annotation?path=/some/page`
pub async fn annotation_handler(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Json<AnnotationResponse> {
    Json(AnnotationResponse {
        path: normalize_path(&query.path),
        annotation: state.scan_service.annotation_for(&query.path).await,
    })
}
