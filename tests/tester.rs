mod common;

use axum::http::StatusCode;
use redirect_manager::application::services::TesterError;
use redirect_manager::domain::entities::{MatchType, RuleInput};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn redirect(status: u16, location: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("Location", location)
}

#[tokio::test]
async fn test_plain_page_is_not_redirected() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());

    let outcome = state.tester_service.test_url("/about").await.unwrap();

    assert_eq!(outcome.url, format!("{}/about", site.uri()));
    assert_eq!(outcome.status_code, 200);
    assert!(!outcome.redirected);
    assert_eq!(outcome.location, None);
}

#[tokio::test]
async fn test_redirect_reports_raw_location() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(redirect(301, "/new?from=old"))
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());

    let outcome = state.tester_service.test_url("old").await.unwrap();

    assert_eq!(outcome.status_code, 301);
    assert!(outcome.redirected);
    assert_eq!(outcome.location.as_deref(), Some("/new?from=old"));
}

#[tokio::test]
async fn test_head_rejected_falls_back_to_get() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/legacy"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/legacy"))
        .respond_with(redirect(302, "https://elsewhere.test/"))
        .expect(1)
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());

    let outcome = state.tester_service.test_url("/legacy").await.unwrap();

    assert_eq!(outcome.status_code, 302);
    assert_eq!(outcome.location.as_deref(), Some("https://elsewhere.test/"));
}

#[tokio::test]
async fn test_chain_follows_hops() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/a"))
        .respond_with(redirect(301, "/b"))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/b"))
        .respond_with(redirect(302, "/c"))
        .mount(&site)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());

    let report = state
        .tester_service
        .check_redirect_chain(&format!("{}/a", site.uri()))
        .await
        .unwrap();

    assert!(report.redirected);
    assert_eq!(report.status_code, Some(200));
    assert_eq!(report.final_url, format!("{}/c", site.uri()));
    assert_eq!(report.chain.len(), 2);
    assert_eq!(report.chain[0].status, 301);
    assert_eq!(report.chain[0].to, format!("{}/b", site.uri()));
    assert_eq!(report.chain[1].status, 302);
    assert!(report.chain.iter().all(|hop| hop.source == "http"));
    assert_eq!(report.error, None);
}

#[tokio::test]
async fn test_chain_stops_after_five_hops() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/loop"))
        .respond_with(redirect(301, "/loop"))
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());

    let report = state
        .tester_service
        .check_redirect_chain("/loop")
        .await
        .unwrap();

    assert_eq!(report.chain.len(), 5);
    assert_eq!(report.status_code, Some(301));
    assert!(report.redirected);
}

#[tokio::test]
async fn test_chain_answers_from_rule_store_first() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());
    state
        .rule_service
        .save(RuleInput {
            id: None,
            from: "/moved".to_string(),
            to: "/destination".to_string(),
            enabled: true,
            status_code: Some(302),
            match_type: MatchType::Exact,
            note: None,
        })
        .await
        .unwrap();

    let report = state
        .tester_service
        .check_redirect_chain(&format!("{}/moved", site.uri()))
        .await
        .unwrap();

    assert_eq!(report.chain.len(), 1);
    assert_eq!(report.chain[0].source, "internal");
    assert_eq!(report.chain[0].status, 302);
    assert_eq!(report.final_url, format!("{}/destination/", site.uri()));
    assert_eq!(report.status_code, Some(302));
}

#[tokio::test]
async fn test_chain_records_transport_error() {
    let (state, _rx) = common::create_test_state();

    let report = state
        .tester_service
        .check_redirect_chain("http://127.0.0.1:1/unreachable")
        .await
        .unwrap();

    assert!(!report.redirected);
    assert!(report.chain.is_empty());
    assert!(report.error.is_some());
    assert_eq!(report.status_code, None);
}

#[tokio::test]
async fn test_test_endpoint_returns_outcome() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(redirect(307, "/new"))
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());
    let server = common::create_test_server(state);

    let response = common::admin(server.post("/api/test"))
        .json(&json!({ "path": "/old" }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status_code"], 307);
    assert_eq!(json["redirected"], true);
    assert_eq!(json["location"], "/new");
}

#[tokio::test]
async fn test_unreachable_site_is_bad_gateway() {
    let (state, _rx) = common::create_test_state_with("http://127.0.0.1:1", Vec::new());
    let server = common::create_test_server(state);

    let response = common::admin(server.post("/api/test"))
        .json(&json!({ "path": "/anything" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let json = response.json::<Value>();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_empty_path_is_rejected() {
    let (state, _rx) = common::create_test_state();
    let server = common::create_test_server(state);

    common::admin(server.post("/api/test"))
        .json(&json!({ "path": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_absolute_url_is_rejected() {
    let site = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&site)
        .await;
    let (state, _rx) = common::create_test_state_with(&site.uri(), Vec::new());

    let err = state
        .tester_service
        .test_url(&format!("{}/about", site.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, TesterError::InvalidUrl(_)));

    let server = common::create_test_server(state);
    common::admin(server.post("/api/test"))
        .json(&json!({ "path": "https://elsewhere.test/x" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
