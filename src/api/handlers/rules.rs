//! Handlers for rule management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::rules::{
    ImportRequest, IncomingResponse, PathQuery, RuleListResponse, RuleResponse, SaveRuleRequest,
    TestResultRequest,
};
use crate::application::services::ImportSummary;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::path_normalizer::normalize_path;

/// Lists every rule in store order.
///
/// # Endpoint
///
/// `GET /api/rules`
pub async fn list_rules_handler(
    State(state): State<AppState>,
) -> Result<Json<RuleListResponse>, AppError> {
    let rules: Vec<RuleResponse> = state
        .rule_service
        .get_all()
        .await?
        .into_iter()
        .map(RuleResponse::from)
        .collect();

    Ok(Json(RuleListResponse {
        total: rules.len(),
        rules,
    }))
}

/// Creates a rule, or replaces one when `id` is given.
///
/// # Endpoint
///
/// `POST /api/rules`
///
/// # Request Body
///
/// ```json
/// {
///   "from": "/old/*",
///   "to": "/new/$1",
///   "match_type": "wildcard",
///   "status_code": 301,
///   "enabled": true,
///   "note": "blog move"
/// }
/// ```
///
/// # Errors
///
/// - 400 if `from`/`to` are empty, the status is not 301/302/307, or the
///   pattern does not compile
/// - 404 if `id` is given but unknown
pub async fn save_rule_handler(
    State(state): State<AppState>,
    Json(payload): Json<SaveRuleRequest>,
) -> Result<(StatusCode, Json<RuleResponse>), AppError> {
    payload.validate()?;

    let status = if payload.id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let saved = state.rule_service.save(payload.into()).await?;

    Ok((status, Json(saved.into())))
}

/// Deletes a rule.
///
/// # Endpoint
///
/// `DELETE /api/rules/{id}`
pub async fn delete_rule_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.rule_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk-imports `from,to[,note]` lines as enabled 301 rules.
///
/// # Endpoint
///
/// `POST /api/rules/import`
///
/// # Response
///
/// ```json
/// { "imported": 2, "skipped": 1, "errors": [ { "line": 2, "error": { ... } } ] }
/// ```
pub async fn import_rules_handler(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    payload.validate()?;
    Ok(Json(state.rule_service.import(&payload.text).await?))
}

/// Reports which rules redirect into a path, and where the path itself goes.
///
/// # Endpoint
///
/// `GET /api/rules/incoming?path=/some/page`
pub async fn incoming_handler(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<IncomingResponse>, AppError> {
    let map = state.redirect_cache.get_map().await?;

    Ok(Json(IncomingResponse {
        path: normalize_path(&query.path),
        redirects_to: map.is_redirected(&query.path).map(|r| r.to.clone()),
        incoming: map.incoming_for(&query.path).to_vec(),
    }))
}

/// Stores a live-test outcome against a rule.
///
/// # Endpoint
///
/// `POST /api/rules/{id}/test-result`
pub async fn record_test_result_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<TestResultRequest>,
) -> Result<StatusCode, AppError> {
    state
        .rule_service
        .record_test_result(&id, payload.into())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
