mod common;

use axum::http::StatusCode;
use redirect_manager::application::hit_worker::run_hit_worker;
use redirect_manager::domain::entities::{MatchType, RedirectRule, RuleInput};
use redirect_manager::state::AppState;
use std::time::Duration;

async fn add_rule(
    state: &AppState,
    from: &str,
    to: &str,
    match_type: MatchType,
    status: u16,
) -> RedirectRule {
    state
        .rule_service
        .save(RuleInput {
            id: None,
            from: from.to_string(),
            to: to.to_string(),
            enabled: true,
            status_code: Some(status),
            match_type,
            note: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_exact_rule_redirects() {
    let (state, _rx) = common::create_test_state();
    add_rule(&state, "/old-page", "/new-page", MatchType::Exact, 301).await;
    let server = common::create_test_server(state);

    let response = server.get("/old-page").await;

    response.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.header("location"),
        "https://site.test/new-page/"
    );
}

#[tokio::test]
async fn test_exact_rule_ignores_case_and_trailing_slash() {
    let (state, _rx) = common::create_test_state();
    add_rule(&state, "/old-page", "/new-page", MatchType::Exact, 301).await;
    let server = common::create_test_server(state);

    server
        .get("/Old-Page/")
        .await
        .assert_status(StatusCode::MOVED_PERMANENTLY);
}

#[tokio::test]
async fn test_query_string_is_carried_to_relative_target() {
    let (state, _rx) = common::create_test_state();
    add_rule(&state, "/old-page", "/new-page", MatchType::Exact, 301).await;
    let server = common::create_test_server(state);

    let response = server.get("/old-page?utm_source=mail").await;

    response.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.header("location"),
        "https://site.test/new-page/?utm_source=mail"
    );
}

#[tokio::test]
async fn test_external_target_is_used_verbatim() {
    let (state, _rx) = common::create_test_state();
    add_rule(
        &state,
        "/partner",
        "https://partner.example/landing",
        MatchType::Exact,
        302,
    )
    .await;
    let server = common::create_test_server(state);

    let response = server.get("/partner?ref=1").await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        "https://partner.example/landing"
    );
}

#[tokio::test]
async fn test_wildcard_captures_are_substituted() {
    let (state, _rx) = common::create_test_state();
    add_rule(&state, "/blog/*", "/news/$1", MatchType::Wildcard, 301).await;
    let server = common::create_test_server(state);

    let response = server.get("/blog/hello-world").await;

    response.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.header("location"),
        "https://site.test/news/hello-world"
    );
}

#[tokio::test]
async fn test_regex_rule_with_temporary_redirect() {
    let (state, _rx) = common::create_test_state();
    add_rule(
        &state,
        r"^/product/(\d+)$",
        "/item/$1",
        MatchType::Regex,
        307,
    )
    .await;
    let server = common::create_test_server(state);

    let response = server.get("/product/42").await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://site.test/item/42");

    server
        .get("/product/abc")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_first_matching_rule_wins() {
    let (state, _rx) = common::create_test_state();
    add_rule(&state, "/dup", "/first", MatchType::Exact, 301).await;
    add_rule(&state, "/dup", "/second", MatchType::Exact, 302).await;
    let server = common::create_test_server(state);

    let response = server.get("/dup").await;

    response.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.header("location"), "https://site.test/first/");
}

#[tokio::test]
async fn test_disabled_rule_is_ignored() {
    let (state, _rx) = common::create_test_state();
    state
        .rule_service
        .save(RuleInput {
            id: None,
            from: "/paused".to_string(),
            to: "/elsewhere".to_string(),
            enabled: false,
            status_code: None,
            match_type: MatchType::Exact,
            note: None,
        })
        .await
        .unwrap();
    let server = common::create_test_server(state);

    let response = server.get("/paused").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_root_rule_skips_requests_with_query() {
    let (state, _rx) = common::create_test_state();
    add_rule(&state, "/", "/home", MatchType::Exact, 301).await;
    let server = common::create_test_server(state);

    server
        .get("/")
        .await
        .assert_status(StatusCode::MOVED_PERMANENTLY);
    server
        .get("/?preview=1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_api_is_never_redirected() {
    let (state, _rx) = common::create_test_state();
    add_rule(&state, "/api/*", "/elsewhere", MatchType::Wildcard, 301).await;
    add_rule(&state, "/health", "/elsewhere", MatchType::Exact, 301).await;
    let server = common::create_test_server(state);

    common::admin(server.get("/api/rules"))
        .await
        .assert_status_ok();
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_hits_are_counted_by_worker() {
    let (state, rx) = common::create_test_state();
    let rule = add_rule(&state, "/counted", "/target", MatchType::Exact, 301).await;
    tokio::spawn(run_hit_worker(
        rx,
        state.rules.clone(),
        state.redirect_cache.clone(),
    ));
    let server = common::create_test_server(state.clone());

    for _ in 0..3 {
        server
            .get("/counted")
            .await
            .assert_status(StatusCode::MOVED_PERMANENTLY);
    }

    let mut hits = 0;
    for _ in 0..100 {
        hits = state.rules.find(&rule.id).await.unwrap().unwrap().hits;
        if hits == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(hits, 3);
    let stored = state.rules.find(&rule.id).await.unwrap().unwrap();
    assert!(stored.last_hit.is_some());
}

#[tokio::test]
async fn test_redirect_survives_closed_hit_queue() {
    let (state, rx) = common::create_test_state();
    add_rule(&state, "/old", "/new", MatchType::Exact, 301).await;
    drop(rx);
    let server = common::create_test_server(state);

    server
        .get("/old")
        .await
        .assert_status(StatusCode::MOVED_PERMANENTLY);
}
