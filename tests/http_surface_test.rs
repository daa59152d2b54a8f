mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn error_body_carries_request_id() {
    let app = TestApp::new().await;
    let response = app
        .request_with_headers(
            Method::GET,
            "/api/customers/31337",
            None,
            &[("x-request-id", "trace-abc-123")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-abc-123"
    );
    let body = response_json(response).await;
    assert_eq!(body["error"], "customer 31337 not found");
    assert_eq!(body["request_id"], "trace-abc-123");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn request_id_is_generated_when_missing_or_unusable() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/materials", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let generated = response.headers().get("x-request-id").unwrap();
    assert!(!generated.is_empty());

    let response = app
        .request_with_headers(
            Method::GET,
            "/api/materials",
            None,
            &[("x-request-id", "has spaces in it")],
        )
        .await;
    let replaced = response.headers().get("x-request-id").unwrap();
    assert_ne!(replaced, "has spaces in it");
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;
    let response = app
        .request_raw(Method::POST, "/api/materials", "{\"name\": \"Cement\",")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].is_string());
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn non_numeric_path_is_a_validation_error() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/orders/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    assert!(body["paths"]["/api/orders"].is_object());
    assert!(body["paths"]["/api/stock/{id}"]["delete"].is_object());
}

#[tokio::test]
async fn unknown_api_route_is_not_found_without_static_dir() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_dir_is_served_with_index_fallback() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>stockbook</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();
    let static_dir = dir.path().display().to_string();

    let app = TestApp::with_config(move |cfg| cfg.static_dir = static_dir).await;

    let response = app.request(Method::GET, "/app.js", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<h1>stockbook</h1>");

    // API routes still win over the fallback.
    let (status, body) = app.get("/api/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
