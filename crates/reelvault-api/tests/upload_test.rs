//! Video upload API integration tests.
//!
//! Run with: `cargo test -p reelvault-api --test upload_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use helpers::{
    setup_test_app, setup_test_app_over, setup_test_app_with, video_form, video_part, Fault,
    FaultyStorage, TEST_BUCKET,
};
use reelvault_api::constants::{LEGACY_UPLOAD_PATH, VIDEO_UPLOAD_PATH};
use reelvault_storage::Storage;
use serde_json::Value;

const SCENARIO_SHA256: &str = "ae4b3280e56e2faf83f414a6e3dabe9d5fbe18976544c05fed121accb85b53fc";

#[tokio::test]
async fn test_upload_created_then_already_exists() {
    let app = setup_test_app();
    let client = app.client();
    let expected_key = format!("videos/12345678/{}.mp4", SCENARIO_SHA256);
    let expected_location = format!("gs://{}/{}", TEST_BUCKET, expected_key);

    let first = client
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("12345678", &[0x00, 0x01, 0x02]))
        .await;
    first.assert_status(StatusCode::CREATED);
    let body: Value = first.json();
    assert_eq!(body["status"], "created");
    assert_eq!(body["location"], expected_location.as_str());
    assert_eq!(body["key"], expected_key.as_str());
    assert_eq!(body["size_bytes"], 3);

    let second = client
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("12345678", &[0x00, 0x01, 0x02]))
        .await;
    second.assert_status_ok();
    let body: Value = second.json();
    assert_eq!(body["status"], "already_exists");
    assert_eq!(body["location"], expected_location.as_str());

    assert_eq!(app.storage.content_length(&expected_key).await.unwrap(), 3);
}

#[tokio::test]
async fn test_legacy_route_and_owner_id_alias() {
    let app = setup_test_app();
    let client = app.client();

    let form = MultipartForm::new()
        .add_part("file", video_part(b"legacy clip"))
        .add_text("owner_id", "V-12.345.678");
    let response = client.post(LEGACY_UPLOAD_PATH).multipart(form).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let key = body["key"].as_str().unwrap();
    assert!(key.starts_with("videos/V-12.345.678/"));
    assert!(key.ends_with(".mp4"));
}

#[tokio::test]
async fn test_same_content_different_owners() {
    let app = setup_test_app();
    let client = app.client();

    let a: Value = client
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("111", b"shared clip"))
        .await
        .json();
    let b: Value = client
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("222", b"shared clip"))
        .await
        .json();

    assert_eq!(a["status"], "created");
    assert_eq!(b["status"], "created");
    assert_ne!(a["location"], b["location"]);
}

#[tokio::test]
async fn test_missing_file() {
    let app = setup_test_app();

    let form = MultipartForm::new().add_text("cedula", "12345678");
    let response = app.client().post(VIDEO_UPLOAD_PATH).multipart(form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_FILE");
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_missing_owner() {
    let app = setup_test_app();

    let form = MultipartForm::new().add_part("file", video_part(b"orphan clip"));
    let response = app.client().post(VIDEO_UPLOAD_PATH).multipart(form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_OWNER_ID");
}

#[tokio::test]
async fn test_traversal_owner_rejected() {
    let app = setup_test_app();

    // Owner after the file: staged locally, rejected before any store call
    let form = MultipartForm::new()
        .add_part("file", video_part(b"evil clip"))
        .add_text("cedula", "../../etc");
    let response = app.client().post(VIDEO_UPLOAD_PATH).multipart(form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_OWNER_ID");

    // Owner before the file: rejected before the body is read
    let response = app
        .client()
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("a/b", b"evil clip"))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_OWNER_ID");
}

#[tokio::test]
async fn test_multiple_file_fields_rejected() {
    let app = setup_test_app();

    let form = video_form("12345678", b"first").add_part("file", video_part(b"second"));
    let response = app.client().post(VIDEO_UPLOAD_PATH).multipart(form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_payload_too_large() {
    let app = setup_test_app_with(|config| config.max_video_size_bytes = 16);

    let response = app
        .client()
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("12345678", &[7u8; 64]))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_get_upload_route_is_method_not_allowed() {
    let app = setup_test_app();

    for path in [VIDEO_UPLOAD_PATH, LEGACY_UPLOAD_PATH] {
        let response = app.client().get(path).await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = response.json();
        assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    }
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = setup_test_app();

    let response = app.client().get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");

    let response = app.client().get("/api-docs/openapi.json").await;
    response.assert_status_ok();
    let spec: Value = response.json();
    assert!(spec["paths"]["/api/v0/videos"]["post"].is_object());
}

#[tokio::test]
async fn test_spool_files_are_cleaned_up() {
    let app = setup_test_app();

    app.client()
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("12345678", &[1u8; 4096]))
        .await
        .assert_status(StatusCode::CREATED);

    let leftovers = std::fs::read_dir(app._spool_dir.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_production_config_hides_error_details() {
    let app = setup_test_app_with(|config| {
        config.environment = "production".to_string();
        config.cors_origins = vec!["https://app.example.com".to_string()];
    });

    let response = app
        .client()
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("a/b", b"clip"))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_OWNER_ID");
    assert!(body.get("details").is_none());
    assert!(body.get("error_type").is_none());
}

#[tokio::test]
async fn test_development_config_shows_error_details() {
    let app = setup_test_app();

    let response = app
        .client()
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("a/b", b"clip"))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error_type"], "InvalidOwnerId");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_oversized_owner_field_rejected() {
    let app = setup_test_app();

    let form = MultipartForm::new()
        .add_text("cedula", "1".repeat(4 * 1024 * 1024))
        .add_part("file", video_part(b"clip"));
    let response = app.client().post(VIDEO_UPLOAD_PATH).multipart(form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_OWNER_ID");
    assert!(body["details"].as_str().unwrap().contains("at most 128"));
}

#[tokio::test]
async fn test_non_utf8_owner_field_rejected() {
    let app = setup_test_app();

    let form = MultipartForm::new()
        .add_part("file", video_part(b"clip"))
        .add_part("cedula", Part::bytes(vec![0x31, 0xff, 0xfe]));
    let response = app.client().post(VIDEO_UPLOAD_PATH).multipart(form).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_OWNER_ID");
}

#[tokio::test]
async fn test_stalled_store_times_out() {
    let app = setup_test_app_over(FaultyStorage::new(Fault::Stall), |config| {
        config.upload_timeout_secs = 1;
    });

    let response = app
        .client()
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("12345678", b"slow clip"))
        .await;

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPLOAD_TIMEOUT");
    assert_eq!(body["recoverable"], true);
}

#[tokio::test]
async fn test_unreachable_store_is_bad_gateway() {
    let app = setup_test_app_over(FaultyStorage::new(Fault::Fail), |_| {});

    let response = app
        .client()
        .post(VIDEO_UPLOAD_PATH)
        .multipart(video_form("12345678", b"clip"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["code"], "STORAGE_EXISTS_CHECK_ERROR");
    assert!(!response.text().contains("googleapis"));
}

#[tokio::test]
async fn test_health_degraded_when_store_fails() {
    let app = setup_test_app_over(FaultyStorage::new(Fault::Fail), |_| {});

    let response = app.client().get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["storage"], "unhealthy");
}
