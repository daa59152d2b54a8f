#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use stockbook_api::{build_router, config::AppConfig, db, AppState};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Router plus state over a fresh SQLite file that lives as long as the harness.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestApp::new`], letting the caller adjust configuration first.
    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let db_path = dir.path().join("stockbook_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.static_dir = dir.path().join("public").display().to_string();
        tweak(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            _dir: dir,
        }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a raw body with a JSON content type, for malformed-input tests.
    pub async fn request_raw(&self, method: Method, uri: &str, raw: &'static str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(raw))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and returns the status with the decoded JSON body.
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::DELETE, uri, None).await
    }

    pub async fn seed_customer(&self, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/customers", json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed customer failed: {body}");
        body["id"].as_i64().expect("customer id")
    }

    pub async fn seed_material(&self, name: &str, unit: &str, price: f64) -> i64 {
        let (status, body) = self
            .post(
                "/api/materials",
                json!({ "name": name, "unit": unit, "price": price }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed material failed: {body}");
        body["id"].as_i64().expect("material id")
    }

    pub async fn post_stock(&self, material_id: i64, quantity: f64) -> (StatusCode, Value) {
        self.post(
            "/api/stock",
            json!({ "material_id": material_id, "quantity": quantity }),
        )
        .await
    }

    /// Current stock quantity for a material, `None` when it has no stock row.
    pub async fn stock_quantity(&self, material_id: i64) -> Option<f64> {
        let (status, body) = self.get("/api/stock").await;
        assert_eq!(status, StatusCode::OK);
        body.as_array()
            .expect("stock list")
            .iter()
            .find(|row| row["material_id"].as_i64() == Some(material_id))
            .map(|row| row["quantity"].as_f64().expect("quantity"))
    }

    pub async fn order_count(&self) -> usize {
        let (status, body) = self.get("/api/orders").await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().expect("order list").len()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    }
}
