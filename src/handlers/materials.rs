use super::common::{created_response, ApiJson, ApiPath, CreatedId, DeletedCount, UpdatedCount};
use crate::{
    errors::ServiceError,
    services::materials::{CreateMaterialRequest, MaterialResponse, UpdateMaterialRequest},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};

pub fn materials_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route(
            "/:id",
            get(get_material).put(update_material).delete(delete_material),
        )
}

/// List materials
#[utoipa::path(
    get,
    path = "/api/materials",
    responses(
        (status = 200, description = "Materials ordered by id", body = [MaterialResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "materials"
)]
pub async fn list_materials(
    State(state): State<AppState>,
) -> Result<Json<Vec<MaterialResponse>>, ServiceError> {
    Ok(Json(state.services.materials.list_materials().await?))
}

/// Get a material
#[utoipa::path(
    get,
    path = "/api/materials/{id}",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material found", body = MaterialResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    tag = "materials"
)]
pub async fn get_material(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<MaterialResponse>, ServiceError> {
    Ok(Json(state.services.materials.get_material(id).await?))
}

/// Create a material
#[utoipa::path(
    post,
    path = "/api/materials",
    request_body = CreateMaterialRequest,
    responses(
        (status = 201, description = "Material created", body = CreatedId),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
    ),
    tag = "materials"
)]
pub async fn create_material(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateMaterialRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let material = state.services.materials.create_material(request).await?;
    Ok(created_response(CreatedId { id: material.id }))
}

/// Update a material's name, unit or price
///
/// Existing usage records and order items keep their recorded prices.
#[utoipa::path(
    put,
    path = "/api/materials/{id}",
    params(("id" = i32, Path, description = "Material id")),
    request_body = UpdateMaterialRequest,
    responses(
        (status = 200, description = "Material updated", body = UpdatedCount),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
    ),
    tag = "materials"
)]
pub async fn update_material(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateMaterialRequest>,
) -> Result<Json<UpdatedCount>, ServiceError> {
    let updated = state.services.materials.update_material(id, request).await?;
    Ok(Json(UpdatedCount { updated }))
}

/// Delete an unreferenced material
#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    params(("id" = i32, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material deleted", body = DeletedCount),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Material is still referenced", body = crate::errors::ErrorResponse),
    ),
    tag = "materials"
)]
pub async fn delete_material(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<DeletedCount>, ServiceError> {
    let deleted = state.services.materials.delete_material(id).await?;
    Ok(Json(DeletedCount { deleted }))
}
