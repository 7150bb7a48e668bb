//! Request-time redirect middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::LOCATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::application::services::RedirectDecision;
use crate::state::AppState;

/// Path prefixes that never take part in dispatch.
const RESERVED_PREFIXES: &[&str] = &["/api", "/health"];

/// Redirects matching requests before they reach any route.
///
/// Requests under `/api` and `/health` pass straight through. Every other
/// request is matched against the rule store; on a hit the rule's status and
/// `Location` are returned, otherwise the request continues unchanged.
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if is_reserved(path) {
        return next.run(req).await;
    }

    let raw_uri = req
        .uri()
        .path_and_query()
        .map_or_else(|| path.to_string(), |pq| pq.as_str().to_string());

    match st.dispatch_service.dispatch(&raw_uri).await {
        Some(decision) => match redirect_response(&decision) {
            Some(response) => response,
            None => next.run(req).await,
        },
        None => next.run(req).await,
    }
}

fn is_reserved(path: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Builds the redirect response, or `None` if the location is not a valid
/// header value.
fn redirect_response(decision: &RedirectDecision) -> Option<Response> {
    let location = match HeaderValue::from_str(&decision.location) {
        Ok(location) => location,
        Err(e) => {
            warn!(rule_id = %decision.rule_id, location = %decision.location, error = %e,
                "Redirect target is not a valid header value");
            return None;
        }
    };

    let status = StatusCode::from_u16(decision.status.code()).unwrap_or(StatusCode::MOVED_PERMANENTLY);

    Some((status, [(LOCATION, location)]).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RedirectStatus;

    #[test]
    fn reserved_prefixes() {
        assert!(is_reserved("/api"));
        assert!(is_reserved("/api/rules"));
        assert!(is_reserved("/health"));
        assert!(!is_reserved("/apiary"));
        assert!(!is_reserved("/healthy-recipes"));
        assert!(!is_reserved("/"));
    }

    #[test]
    fn response_carries_status_and_location() {
        let response = redirect_response(&RedirectDecision {
            rule_id: "r_1".to_string(),
            location: "https://site.test/new/".to_string(),
            status: RedirectStatus::TemporaryRedirect,
        })
        .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://site.test/new/"
        );
    }

    #[test]
    fn invalid_location_is_skipped() {
        let decision = RedirectDecision {
            rule_id: "r_1".to_string(),
            location: "/bad\nheader".to_string(),
            status: RedirectStatus::MovedPermanently,
        };
        assert!(redirect_response(&decision).is_none());
    }
}
