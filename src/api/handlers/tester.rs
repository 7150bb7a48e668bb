//! Handlers for live redirect testing.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::tester::{ChainRequest, TestRequest};
use crate::application::services::TesterError;
use crate::error::AppError;
use crate::state::AppState;

/// Probes `SITE_URL + path` once without following redirects.
///
/// # Endpoint
///
/// `POST /api/test`
///
/// # Response Codes
///
/// - **200 OK**: `{ "url", "status_code", "redirected", "location" }`
/// - **400 Bad Request**: Malformed path or an absolute URL
/// - **502 Bad Gateway**: The site could not be reached
pub async fn test_url_handler(
    State(state): State<AppState>,
    Json(payload): Json<TestRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    match state.tester_service.test_url(&payload.path).await {
        Ok(outcome) => Ok(Json(outcome).into_response()),
        Err(e) => tester_error(e),
    }
}

/// Follows a redirect chain for up to five hops.
///
/// # Endpoint
///
/// `POST /api/test/chain`
///
/// A rule in the store answers first with a single `internal` hop. Transport
/// errors end the chain and are reported in the body's `error` field.
pub async fn chain_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChainRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    match state.tester_service.check_redirect_chain(&payload.url).await {
        Ok(report) => Ok(Json(report).into_response()),
        Err(e) => tester_error(e),
    }
}

fn tester_error(e: TesterError) -> Result<Response, AppError> {
    match e {
        TesterError::InvalidUrl(reason) => Err(AppError::bad_request(
            "Invalid URL",
            json!({ "reason": reason }),
        )),
        TesterError::Transport(reason) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": reason })),
        )
            .into_response()),
    }
}
