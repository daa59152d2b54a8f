use super::common::{created_response, ApiJson, ApiPath, CreatedId, DeletedCount};
use crate::{
    errors::ServiceError,
    services::stock::{PostStockRequest, StockView},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

pub fn stock_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock).post(post_stock))
        .route("/:id", get(get_stock).delete(delete_stock))
}

/// List stock levels with material name and unit
#[utoipa::path(
    get,
    path = "/api/stock",
    responses(
        (status = 200, description = "Stock rows", body = [StockView]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
) -> Result<Json<Vec<StockView>>, ServiceError> {
    Ok(Json(state.services.stock.list_stock().await?))
}

/// Get one stock row
#[utoipa::path(
    get,
    path = "/api/stock/{id}",
    params(("id" = i32, Path, description = "Stock row id")),
    responses(
        (status = 200, description = "Stock row", body = StockView),
        (status = 404, description = "Stock row not found", body = crate::errors::ErrorResponse),
    ),
    tag = "stock"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<StockView>, ServiceError> {
    Ok(Json(state.services.stock.get_stock(id).await?))
}

/// Add (or with a negative quantity, remove) stock for a material
#[utoipa::path(
    post,
    path = "/api/stock",
    request_body = PostStockRequest,
    responses(
        (status = 201, description = "Stock row created or updated", body = CreatedId),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Posting would make stock negative", body = crate::errors::ErrorResponse),
    ),
    tag = "stock"
)]
pub async fn post_stock(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PostStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.services.stock.post_stock(request).await?;
    Ok(created_response(CreatedId { id }))
}

/// Delete a stock row
#[utoipa::path(
    delete,
    path = "/api/stock/{id}",
    params(("id" = i32, Path, description = "Stock row id")),
    responses(
        (status = 200, description = "Stock row deleted", body = DeletedCount),
        (status = 404, description = "Stock row not found", body = crate::errors::ErrorResponse),
    ),
    tag = "stock"
)]
pub async fn delete_stock(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<DeletedCount>, ServiceError> {
    let deleted = state.services.stock.delete_stock(id).await?;
    Ok(Json(DeletedCount { deleted }))
}
