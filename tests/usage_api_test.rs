mod common;

use axum::http::StatusCode;
use common::TestApp;
use rstest::rstest;
use serde_json::json;

#[tokio::test]
async fn usage_is_priced_at_current_material_price() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Acme").await;
    let material = app.seed_material("Cement", "kg", 10.0).await;

    let (status, record) = app
        .post(
            "/api/usage",
            json!({ "customer_id": customer, "material_id": material, "quantity": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["price"].as_f64(), Some(30.0));
    assert_eq!(record["quantity"].as_f64(), Some(3.0));
}

#[tokio::test]
async fn price_changes_do_not_rewrite_history() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Acme").await;
    let material = app.seed_material("Cement", "kg", 10.0).await;

    app.post(
        "/api/usage",
        json!({ "customer_id": customer, "material_id": material, "quantity": 3 }),
    )
    .await;
    let (status, _) = app
        .put(&format!("/api/materials/{material}"), json!({ "price": 99 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, usage) = app.get(&format!("/api/usage/{customer}")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = usage.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["price"].as_f64(), Some(30.0));
    assert_eq!(rows[0]["name"], "Cement");
    assert_eq!(rows[0]["unit"], "kg");
}

#[tokio::test]
async fn usage_does_not_touch_stock() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Acme").await;
    let material = app.seed_material("Cement", "kg", 10.0).await;
    app.post_stock(material, 5.0).await;

    app.post(
        "/api/usage",
        json!({ "customer_id": customer, "material_id": material, "quantity": 2 }),
    )
    .await;
    assert_eq!(app.stock_quantity(material).await, Some(5.0));
}

#[tokio::test]
async fn summary_totals_a_customers_usage() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Acme").await;
    let other = app.seed_customer("Other").await;
    let cement = app.seed_material("Cement", "kg", 10.0).await;
    let sand = app.seed_material("Sand", "m3", 2.5).await;

    for (who, material, quantity) in [(customer, cement, 3), (customer, sand, 4), (other, sand, 1)] {
        let (status, _) = app
            .post(
                "/api/usage",
                json!({ "customer_id": who, "material_id": material, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) = app.get(&format!("/api/usage/{customer}/total")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["customer_id"].as_i64(), Some(customer));
    assert_eq!(summary["records"], 2);
    assert_eq!(summary["total"].as_f64(), Some(40.0));
}

#[tokio::test]
async fn unknown_customer_has_no_usage() {
    let app = TestApp::new().await;
    let (status, usage) = app.get("/api/usage/404").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage, json!([]));

    let (_, summary) = app.get("/api/usage/404/total").await;
    assert_eq!(summary["records"], 0);
    assert_eq!(summary["total"].as_f64(), Some(0.0));
}

#[rstest]
#[case::unknown_material(false, true, StatusCode::NOT_FOUND)]
#[case::unknown_customer(true, false, StatusCode::NOT_FOUND)]
#[tokio::test]
async fn usage_with_missing_references_fails(
    #[case] real_customer: bool,
    #[case] real_material: bool,
    #[case] expected: StatusCode,
) {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Acme").await;
    let material = app.seed_material("Cement", "kg", 10.0).await;

    let (status, body) = app
        .post(
            "/api/usage",
            json!({
                "customer_id": if real_customer { customer } else { 777 },
                "material_id": if real_material { material } else { 888 },
                "quantity": 1
            }),
        )
        .await;
    assert_eq!(status, expected);
    assert!(body["error"].as_str().unwrap().ends_with("not found"));

    let (_, usage) = app.get(&format!("/api/usage/{customer}")).await;
    assert_eq!(usage, json!([]));
}

#[rstest]
#[case(0)]
#[case(-2)]
#[tokio::test]
async fn non_positive_usage_quantity_is_rejected(#[case] quantity: i64) {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Acme").await;
    let material = app.seed_material("Cement", "kg", 10.0).await;

    let (status, _) = app
        .post(
            "/api/usage",
            json!({ "customer_id": customer, "material_id": material, "quantity": quantity }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
