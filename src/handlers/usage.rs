use super::common::{created_response, ApiJson, ApiPath};
use crate::{
    errors::ServiceError,
    services::usage::{RecordUsageRequest, UsageRecordResponse, UsageSummary, UsageView},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

pub fn usage_router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_usage))
        .route("/:customer_id", get(list_customer_usage))
        .route("/:customer_id/total", get(customer_usage_total))
}

/// Record material usage for a customer at the current price
#[utoipa::path(
    post,
    path = "/api/usage",
    request_body = RecordUsageRequest,
    responses(
        (status = 201, description = "Usage recorded", body = UsageRecordResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or material not found", body = crate::errors::ErrorResponse),
    ),
    tag = "usage"
)]
pub async fn record_usage(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecordUsageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state.services.usage.record_usage(request).await?;
    Ok(created_response(record))
}

/// List a customer's usage records
#[utoipa::path(
    get,
    path = "/api/usage/{customer_id}",
    params(("customer_id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Usage records with material details", body = [UsageView]),
    ),
    tag = "usage"
)]
pub async fn list_customer_usage(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<i32>,
) -> Result<Json<Vec<UsageView>>, ServiceError> {
    Ok(Json(
        state.services.usage.list_for_customer(customer_id).await?,
    ))
}

/// Sum of a customer's recorded usage prices
#[utoipa::path(
    get,
    path = "/api/usage/{customer_id}/total",
    params(("customer_id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Usage bill summary", body = UsageSummary),
    ),
    tag = "usage"
)]
pub async fn customer_usage_total(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<i32>,
) -> Result<Json<UsageSummary>, ServiceError> {
    Ok(Json(
        state
            .services
            .usage
            .summarize_for_customer(customer_id)
            .await?,
    ))
}
