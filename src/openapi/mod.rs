use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockbook API",
        description = r#"
Inventory and billing backend for a small materials business.

Prices are frozen onto usage records and order items when they are written;
later price changes never rewrite history. Placing an order decrements stock
in the same transaction that stores the order.

Errors share one body shape:

```json
{ "error": "material 7 not found", "request_id": "3f0c...", "timestamp": "2024-01-01T00:00:00Z" }
```
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "customers", description = "Customer records"),
        (name = "materials", description = "Material catalogue and prices"),
        (name = "stock", description = "Stock levels per material"),
        (name = "usage", description = "Per-customer material usage"),
        (name = "orders", description = "Multi-item orders"),
        (name = "health", description = "Service health")
    ),
    paths(
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::delete_customer,

        crate::handlers::materials::list_materials,
        crate::handlers::materials::get_material,
        crate::handlers::materials::create_material,
        crate::handlers::materials::update_material,
        crate::handlers::materials::delete_material,

        crate::handlers::stock::list_stock,
        crate::handlers::stock::get_stock,
        crate::handlers::stock::post_stock,
        crate::handlers::stock::delete_stock,

        crate::handlers::usage::record_usage,
        crate::handlers::usage::list_customer_usage,
        crate::handlers::usage::customer_usage_total,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::handlers::common::CreatedId,
            crate::handlers::common::UpdatedCount,
            crate::handlers::common::DeletedCount,
            crate::services::customers::CreateCustomerRequest,
            crate::services::customers::CustomerResponse,
            crate::services::materials::CreateMaterialRequest,
            crate::services::materials::UpdateMaterialRequest,
            crate::services::materials::MaterialResponse,
            crate::services::stock::PostStockRequest,
            crate::services::stock::StockView,
            crate::services::usage::RecordUsageRequest,
            crate::services::usage::UsageRecordResponse,
            crate::services::usage::UsageView,
            crate::services::usage::UsageSummary,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderLineRequest,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::OrderResponse,
            crate::health::HealthStatus,
            crate::health::HealthInfo,
        )
    )
)]
pub struct ApiDoc;

pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
