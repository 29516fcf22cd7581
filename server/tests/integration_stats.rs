use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

const STATS: &str = r#"{
  "by_lang": {"docs": 100, "tokens": 5000, "groups": [
    {"identity": {"lang": "en"}, "docs": 60, "tokens": 3000},
    {"identity": {"lang": "fr"}, "docs": 40, "tokens": 2000}
  ]},
  "by_lang_source": {"docs": 120, "tokens": 5000, "groups": [
    {"identity": {"lang": "en", "source": "web"}, "docs": 50, "tokens": 2500},
    {"identity": {"lang": "en", "source": "books"}, "docs": 10, "tokens": 500},
    {"identity": {"lang": "fr", "source": "web"}, "docs": 40, "tokens": 2000}
  ]}
}"#;

fn build_test_app() -> (tempfile::TempDir, Router) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.json");
    fs::write(&path, STATS).unwrap();
    let app = server::build_app(path.to_string_lossy().to_string()).unwrap();
    (dir, app)
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

#[tokio::test]
async fn stats_returns_whole_document() {
    let (_dir, app) = build_test_app();
    let (status, body) = call(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let expected: Value = serde_json::from_str(STATS).unwrap();
    assert_eq!(json, expected);
}

#[tokio::test]
async fn grouping_lookup_and_not_found() {
    let (_dir, app) = build_test_app();
    let (status, body) = call(app.clone(), "/stats/by_lang").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["groups"].as_array().unwrap().len(), 2);
    assert_eq!(json["groups"][1]["identity"]["lang"], "fr");

    let (status, _) = call(app, "/stats/by_year").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nested_view_buckets_by_field() {
    let (_dir, app) = build_test_app();
    let (status, body) = call(app.clone(), "/stats/by_lang_source/nested?field=lang").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let groups = json["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["identity"], "en");
    assert_eq!(groups[0]["groups"].as_array().unwrap().len(), 2);
    assert_eq!(groups[0]["groups"][1]["identity"]["source"], "books");

    let (status, _) = call(app, "/stats/by_lang/nested?field=source").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checks_report_filtered_grouping() {
    let (_dir, app) = build_test_app();
    let (status, body) = call(app, "/checks").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["groupings"], 2);
    let warnings = json["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["kind"], "inconsistent_totals");
    assert_eq!(warnings[0]["path"], "by_lang_source");
    assert_eq!(warnings[0]["expected"], 120);
    assert_eq!(warnings[0]["actual"], 100);
}

#[tokio::test]
async fn missing_stats_file_fails_startup() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    assert!(server::build_app(missing.to_string_lossy().to_string()).is_err());
}

#[tokio::test]
async fn cors_allows_only_listed_origins() {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .layer(server::cors_layer(Some("https://stats.example, ,")));

    let req = Request::get("/health").header(header::ORIGIN, "https://stats.example").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://stats.example");

    let req = Request::get("/health").header(header::ORIGIN, "https://other.example").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn cors_defaults_to_any_origin() {
    let app = Router::new().route("/health", get(|| async { "ok" })).layer(server::cors_layer(None));
    let req = Request::get("/health").header(header::ORIGIN, "https://anywhere.example").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
