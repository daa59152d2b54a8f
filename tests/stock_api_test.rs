mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn postings_accumulate_on_a_single_row() {
    let app = TestApp::new().await;
    let material = app.seed_material("Cement", "kg", 8.5).await;

    let (status, first) = app.post_stock(material, 5.0).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = app.post_stock(material, -2.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["id"], second["id"]);

    let (_, list) = app.get("/api/stock").await;
    let rows = list.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["quantity"].as_f64(), Some(3.0));
    assert_eq!(rows[0]["name"], "Cement");
    assert_eq!(rows[0]["unit"], "kg");
}

#[tokio::test]
async fn stock_row_can_be_fetched_and_deleted() {
    let app = TestApp::new().await;
    let material = app.seed_material("Sand", "m3", 30.0).await;
    let (_, created) = app.post_stock(material, 7.0).await;
    let id = created["id"].as_i64().unwrap();

    let (status, row) = app.get(&format!("/api/stock/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["material_id"].as_i64(), Some(material));
    assert_eq!(row["quantity"].as_f64(), Some(7.0));

    let (status, body) = app.delete(&format!("/api/stock/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 1 }));

    let (status, _) = app.get(&format!("/api/stock/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/api/stock/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posting_for_unknown_material_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.post_stock(99, 1.0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "material 99 not found");

    let (_, list) = app.get("/api/stock").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn negative_stock_is_allowed_by_default() {
    let app = TestApp::new().await;
    let material = app.seed_material("Lime", "kg", 1.0).await;

    let (status, _) = app.post_stock(material, -4.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.stock_quantity(material).await, Some(-4.0));
}

#[tokio::test]
async fn strict_policy_rejects_going_below_zero() {
    let app = TestApp::with_config(|cfg| cfg.allow_negative_stock = false).await;
    let material = app.seed_material("Lime", "kg", 1.0).await;

    let (status, _) = app.post_stock(material, 2.0).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post_stock(material, -3.0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
    assert_eq!(app.stock_quantity(material).await, Some(2.0));

    let (status, _) = app.post_stock(material, -2.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.stock_quantity(material).await, Some(0.0));
}

#[tokio::test]
async fn strict_policy_does_not_create_negative_rows() {
    let app = TestApp::with_config(|cfg| cfg.allow_negative_stock = false).await;
    let material = app.seed_material("Lime", "kg", 1.0).await;

    let (status, _) = app.post_stock(material, -1.0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.stock_quantity(material).await, None);
}
