mod common;

use axum::http::StatusCode;
use common::StaticSource;
use redirect_manager::domain::entities::ExternalRedirectRecord;
use redirect_manager::domain::sources::RedirectSource;
use redirect_manager::infrastructure::sources::HtaccessSource;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

#[tokio::test]
async fn test_scan_reports_unconfigured_htaccess_as_unavailable() {
    let sources: Vec<Arc<dyn RedirectSource>> = vec![Arc::new(HtaccessSource::new(None))];
    let (state, _rx) = common::create_test_state_with(common::SITE_URL, sources);
    let server = common::create_test_server(state);

    let response = common::admin(server.post("/api/scan")).await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
    assert_eq!(json["sources_checked"]["htaccess"]["available"], false);
    assert_eq!(json["sources_checked"]["htaccess"]["found"], 0);
}

#[tokio::test]
async fn test_scan_reads_htaccess_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "RewriteEngine On").unwrap();
    writeln!(file, "Redirect 301 /old-about /about").unwrap();
    writeln!(file, "RedirectMatch 302 ^/docs/(.*)$ /manual/$1").unwrap();

    let sources: Vec<Arc<dyn RedirectSource>> = vec![Arc::new(HtaccessSource::new(Some(
        file.path().to_path_buf(),
    )))];
    let (state, _rx) = common::create_test_state_with(common::SITE_URL, sources);
    let server = common::create_test_server(state);

    let json = common::admin(server.post("/api/scan"))
        .await
        .json::<Value>();

    assert_eq!(json["sources_checked"]["htaccess"]["available"], true);
    assert_eq!(json["sources_checked"]["htaccess"]["found"], 2);
    assert_eq!(json["results"][0]["from"], "/old-about");
    assert_eq!(json["results"][0]["to"], "/about");
    assert_eq!(json["results"][0]["status"], 301);
    assert_eq!(json["results"][1]["status"], 302);
}

#[tokio::test]
async fn test_failing_source_does_not_break_scan() {
    let sources: Vec<Arc<dyn RedirectSource>> = vec![
        Arc::new(StaticSource {
            name: "redirection",
            available: true,
            records: Ok(vec![
                ExternalRedirectRecord::new("/Legacy/", "/current", 301, "redirection")
                    .with_hits(4),
            ]),
        }),
        Arc::new(StaticSource {
            name: "rank_math",
            available: true,
            records: Err("unreadable sources column".to_string()),
        }),
    ];
    let (state, _rx) = common::create_test_state_with(common::SITE_URL, sources);
    let server = common::create_test_server(state);

    let json = common::admin(server.post("/api/scan"))
        .await
        .json::<Value>();

    assert_eq!(json["sources_checked"]["redirection"]["available"], true);
    assert_eq!(json["sources_checked"]["redirection"]["found"], 1);
    assert_eq!(json["sources_checked"]["rank_math"]["available"], false);
    assert_eq!(json["results"][0]["hits"], 4);
}

#[tokio::test]
async fn test_cached_scan_annotation_and_clear() {
    let sources: Vec<Arc<dyn RedirectSource>> = vec![Arc::new(StaticSource {
        name: "redirection",
        available: true,
        records: Ok(vec![ExternalRedirectRecord::new(
            "/Legacy/",
            "/current",
            307,
            "redirection",
        )]),
    })];
    let (state, _rx) = common::create_test_state_with(common::SITE_URL, sources);
    let server = common::create_test_server(state);

    let before = common::admin(server.get("/api/scan")).await.json::<Value>();
    assert!(before["report"].is_null());
    assert!(before["last_scanned"].is_null());

    common::admin(server.post("/api/scan"))
        .await
        .assert_status_ok();

    let cached = common::admin(server.get("/api/scan")).await.json::<Value>();
    assert_eq!(cached["report"]["results"][0]["from"], "/Legacy/");
    assert!(cached["last_scanned"].is_string());

    let annotation = common::admin(server.get("/api/scan/annotation"))
        .add_query_param("path", "/legacy")
        .await
        .json::<Value>();
    assert_eq!(annotation["path"], "/legacy");
    assert_eq!(annotation["annotation"]["redirects_to"], "/current");
    assert_eq!(annotation["annotation"]["status"], 307);
    assert_eq!(annotation["annotation"]["source"], "redirection");

    common::admin(server.delete("/api/scan"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let after = common::admin(server.get("/api/scan")).await.json::<Value>();
    assert!(after["report"].is_null());

    let annotation = common::admin(server.get("/api/scan/annotation"))
        .add_query_param("path", "/legacy")
        .await
        .json::<Value>();
    assert!(annotation["annotation"].is_null());
}

#[tokio::test]
async fn test_scan_requires_token() {
    let (state, _rx) = common::create_test_state();
    let server = common::create_test_server(state);

    server.post("/api/scan")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
