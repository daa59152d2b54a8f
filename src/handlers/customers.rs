use super::common::{created_response, ApiJson, ApiPath, DeletedCount};
use crate::{
    errors::ServiceError,
    services::customers::{CreateCustomerRequest, CustomerResponse},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

pub fn customers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer).delete(delete_customer))
}

/// List customers
#[utoipa::path(
    get,
    path = "/api/customers",
    responses(
        (status = 200, description = "Customers ordered by id", body = [CustomerResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, ServiceError> {
    Ok(Json(state.services.customers.list_customers().await?))
}

/// Get a customer
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<CustomerResponse>, ServiceError> {
    Ok(Json(state.services.customers.get_customer(id).await?))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.create_customer(request).await?;
    Ok(created_response(customer))
}

/// Delete a customer without usage or orders
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deleted", body = DeletedCount),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Customer has usage records or orders", body = crate::errors::ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<DeletedCount>, ServiceError> {
    let deleted = state.services.customers.delete_customer(id).await?;
    Ok(Json(DeletedCount { deleted }))
}
