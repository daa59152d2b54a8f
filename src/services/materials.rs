use super::{conflict_on_reference, validate_not_blank};
use crate::{
    db::{with_transaction, DbPool},
    entities::{
        material::{self, Entity as MaterialEntity},
        order_item::{self, Entity as OrderItemEntity},
        stock::{self, Entity as StockEntity},
        usage::{self, Entity as UsageEntity},
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMaterialRequest {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Cement")]
    pub name: String,
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "kg")]
    pub unit: String,
    /// Unit price, accepted as a JSON number or numeric string
    #[schema(value_type = f64, example = 8.5)]
    pub price: Decimal,
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateMaterialRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
}

impl UpdateMaterialRequest {
    fn check(&self) -> Result<(), ServiceError> {
        if self.name.is_none() && self.unit.is_none() && self.price.is_none() {
            return Err(ServiceError::ValidationError(
                "at least one of name, unit or price is required".to_string(),
            ));
        }
        for (field, value) in [("name", &self.name), ("unit", &self.unit)] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ServiceError::ValidationError(format!(
                    "{} must not be blank",
                    field
                )));
            }
        }
        if let Some(price) = self.price {
            ensure_price(price)?;
        }
        Ok(())
    }
}

fn ensure_price(price: Decimal) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MaterialResponse {
    pub id: i32,
    pub name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl From<material::Model> for MaterialResponse {
    fn from(model: material::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            unit: model.unit,
            price: model.price,
        }
    }
}

/// Service for the material catalogue
#[derive(Clone)]
pub struct MaterialService {
    db_pool: Arc<DbPool>,
}

impl MaterialService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_materials(&self) -> Result<Vec<MaterialResponse>, ServiceError> {
        let materials = MaterialEntity::find()
            .order_by_asc(material::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(materials.into_iter().map(MaterialResponse::from).collect())
    }

    #[instrument(skip(self), fields(material_id = %id))]
    pub async fn get_material(&self, id: i32) -> Result<MaterialResponse, ServiceError> {
        MaterialEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .map(MaterialResponse::from)
            .ok_or_else(|| ServiceError::not_found("material", id))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_material(
        &self,
        request: CreateMaterialRequest,
    ) -> Result<MaterialResponse, ServiceError> {
        request.validate()?;
        ensure_price(request.price)?;

        let created = material::ActiveModel {
            name: Set(request.name.trim().to_string()),
            unit: Set(request.unit.trim().to_string()),
            price: Set(request.price),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(material_id = created.id, price = %created.price, "Material created");
        Ok(created.into())
    }

    /// Updates the given fields and returns the number of rows changed.
    ///
    /// Usage records and order items keep the price they were written with.
    #[instrument(skip(self, request), fields(material_id = %id))]
    pub async fn update_material(
        &self,
        id: i32,
        request: UpdateMaterialRequest,
    ) -> Result<u64, ServiceError> {
        request.check()?;

        let mut update = MaterialEntity::update_many().filter(material::Column::Id.eq(id));
        if let Some(name) = request.name {
            update = update.col_expr(material::Column::Name, Expr::value(name.trim().to_string()));
        }
        if let Some(unit) = request.unit {
            update = update.col_expr(material::Column::Unit, Expr::value(unit.trim().to_string()));
        }
        if let Some(price) = request.price {
            update = update.col_expr(material::Column::Price, Expr::value(price));
        }

        let result = update.exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("material", id));
        }

        info!(rows = result.rows_affected, "Material updated");
        Ok(result.rows_affected)
    }

    /// Deletes a material that nothing references.
    ///
    /// The reference check and the delete share one transaction.
    #[instrument(skip(self), fields(material_id = %id))]
    pub async fn delete_material(&self, id: i32) -> Result<u64, ServiceError> {
        let deleted = with_transaction::<_, _, ServiceError>(&self.db_pool, "delete_material", move |txn| {
            Box::pin(async move { delete_unreferenced_material(txn, id).await })
        })
        .await?;
        info!("Material deleted");
        Ok(deleted)
    }
}

async fn delete_unreferenced_material<C>(conn: &C, id: i32) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    if MaterialEntity::find_by_id(id).one(conn).await?.is_none() {
        return Err(ServiceError::not_found("material", id));
    }

    let stock_rows = StockEntity::find()
        .filter(stock::Column::MaterialId.eq(id))
        .count(conn)
        .await?;
    let usage_records = UsageEntity::find()
        .filter(usage::Column::MaterialId.eq(id))
        .count(conn)
        .await?;
    let order_items = OrderItemEntity::find()
        .filter(order_item::Column::MaterialId.eq(id))
        .count(conn)
        .await?;

    if stock_rows + usage_records + order_items > 0 {
        warn!(stock_rows, usage_records, order_items, "Refusing to delete referenced material");
        return Err(ServiceError::Conflict(format!(
            "material {} is referenced by {} stock row(s), {} usage record(s) and {} order item(s)",
            id, stock_rows, usage_records, order_items
        )));
    }

    let result = MaterialEntity::delete_by_id(id)
        .exec(conn)
        .await
        .map_err(|e| conflict_on_reference(e, || format!("material {} is still referenced", id)))?;
    Ok(result.rows_affected)
}
