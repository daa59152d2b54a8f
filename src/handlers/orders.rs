use super::common::{created_response, ApiJson, ApiPath};
use crate::{
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderResponse},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

pub fn orders_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
}

/// List orders with their items, newest first
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders with items", body = [OrderResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    Ok(Json(state.services.orders.list_orders().await?))
}

/// Get one order with its items
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<OrderResponse>, ServiceError> {
    Ok(Json(state.services.orders.get_order(id).await?))
}

/// Place an order
///
/// Prices every line at the current material price, writes the order and
/// its items, and decrements stock, all in one transaction.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or material not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Order would oversell stock", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(request).await?;
    Ok(created_response(order))
}
