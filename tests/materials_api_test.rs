mod common;

use axum::http::StatusCode;
use common::TestApp;
use rstest::rstest;
use serde_json::json;

#[tokio::test]
async fn created_material_round_trips_through_list() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/materials",
            json!({ "name": "Cement", "unit": "kg", "price": 8.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, list) = app.get("/api/materials").await;
    assert_eq!(status, StatusCode::OK);
    let cement = list
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"].as_i64() == Some(id))
        .expect("created material listed");
    assert_eq!(cement["name"], "Cement");
    assert_eq!(cement["unit"], "kg");
    assert_eq!(cement["price"].as_f64(), Some(8.5));
}

#[tokio::test]
async fn price_accepts_numeric_strings() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/api/materials",
            json!({ "name": "Sand", "unit": "m3", "price": "12.25" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, material) = app
        .get(&format!("/api/materials/{}", body["id"]))
        .await;
    assert_eq!(material["price"].as_f64(), Some(12.25));
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let app = TestApp::new().await;
    let id = app.seed_material("Gravel", "t", 20.0).await;

    let (status, body) = app
        .put(&format!("/api/materials/{id}"), json!({ "price": 22.5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "updated": 1 }));

    let (_, material) = app.get(&format!("/api/materials/{id}")).await;
    assert_eq!(material["name"], "Gravel");
    assert_eq!(material["unit"], "t");
    assert_eq!(material["price"].as_f64(), Some(22.5));
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "name": "  " }))]
#[case(json!({ "price": -1 }))]
#[tokio::test]
async fn invalid_updates_are_rejected(#[case] payload: serde_json::Value) {
    let app = TestApp::new().await;
    let id = app.seed_material("Lime", "kg", 3.0).await;

    let (status, body) = app.put(&format!("/api/materials/{id}"), payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[rstest]
#[case(json!({ "name": "", "unit": "kg", "price": 1 }))]
#[case(json!({ "name": "Brick", "unit": " ", "price": 1 }))]
#[case(json!({ "name": "Brick", "unit": "pc", "price": -0.5 }))]
#[case(json!({ "name": "Brick", "unit": "pc" }))]
#[tokio::test]
async fn invalid_materials_are_rejected(#[case] payload: serde_json::Value) {
    let app = TestApp::new().await;
    let (status, _) = app.post("/api/materials", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, list) = app.get("/api/materials").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_material_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/materials/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "material 42 not found");

    let (status, _) = app
        .put("/api/materials/42", json!({ "name": "Ghost" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/api/materials/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unreferenced_material() {
    let app = TestApp::new().await;
    let id = app.seed_material("Tar", "l", 4.0).await;

    let (status, body) = app.delete(&format!("/api/materials/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 1 }));

    let (status, _) = app.get(&format!("/api/materials/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_material_with_stock_conflicts() {
    let app = TestApp::new().await;
    let id = app.seed_material("Steel", "kg", 2.0).await;
    let (status, _) = app.post_stock(id, 10.0).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.delete(&format!("/api/materials/{id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("stock"));

    let (status, _) = app.get(&format!("/api/materials/{id}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_material_with_usage_conflicts() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Acme").await;
    let id = app.seed_material("Cement", "kg", 10.0).await;
    let (status, _) = app
        .post(
            "/api/usage",
            json!({ "customer_id": customer, "material_id": id, "quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.delete(&format!("/api/materials/{id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("1 usage record"));

    let (_, usage) = app.get(&format!("/api/usage/{customer}")).await;
    assert_eq!(usage.as_array().unwrap().len(), 1);
}
