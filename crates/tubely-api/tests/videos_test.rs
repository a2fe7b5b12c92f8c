//! Video record, health and documentation endpoint tests.
//!
//! Run with: `cargo test -p tubely-api --test videos_test`

mod helpers;

use axum::http::StatusCode;
use helpers::setup_test_app;
use serde_json::json;
use tubely_core::VideoRecord;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_list_videos() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();

    let response = app
        .client()
        .post("/api/videos")
        .add_header("Authorization", app.bearer(owner))
        .json(&json!({ "title": "Boots", "description": "Walking in the park" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: VideoRecord = response.json();
    assert_eq!(created.user_id, owner);
    assert_eq!(created.title, "Boots");
    assert!(created.video_url.is_none());

    // Another user's video is not listed.
    app.create_video(Uuid::new_v4()).await;

    let response = app
        .client()
        .get("/api/videos")
        .add_header("Authorization", app.bearer(owner))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let listed: Vec<VideoRecord> = response.json();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn test_create_video_validates_body() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();

    let response = app
        .client()
        .post("/api/videos")
        .add_header("Authorization", app.bearer(owner))
        .json(&json!({ "title": "" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .client()
        .post("/api/videos")
        .add_header("Authorization", app.bearer(owner))
        .json(&json!({ "description": "no title" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_get_video_checks_owner() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.create_video(owner).await;
    let path = format!("/api/videos/{}", video.id);

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", app.bearer(owner))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<VideoRecord>(), video);

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", app.bearer(Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .client()
        .get(&format!("/api/videos/{}", Uuid::new_v4()))
        .add_header("Authorization", app.bearer(owner))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_video_routes_require_token() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/videos").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let response = app
        .client()
        .get("/api/videos")
        .add_header("Authorization", "Basic dXNlcjpwYXNz")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");

    let response = app.client().get("/health/ready").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["database"], "ready");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/openapi.json").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"].get("/api/video_upload/{video_id}").is_some());
    assert!(doc["components"]["securitySchemes"].get("bearer_auth").is_some());
}

#[tokio::test]
async fn test_request_id_echoed() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/health")
        .add_header("X-Request-ID", "trace-123")
        .await;
    assert_eq!(response.header("x-request-id"), "trace-123");

    let response = app.client().get("/health").await;
    assert!(!response.header("x-request-id").is_empty());
}
