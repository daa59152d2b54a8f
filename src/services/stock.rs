use crate::{
    db::{with_transaction, DbPool},
    entities::{
        material::{self, Entity as MaterialEntity},
        stock::{self, Entity as StockEntity},
    },
    errors::ServiceError,
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

/// Whether a stock row may go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPolicy {
    pub allow_negative: bool,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            allow_negative: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PostStockRequest {
    pub material_id: i32,
    /// Signed delta added to the current quantity
    #[schema(value_type = f64, example = 5)]
    pub quantity: Decimal,
}

/// Stock row joined with its material, as the stock page lists it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockView {
    pub id: i32,
    pub material_id: i32,
    pub name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub quantity: Decimal,
}

impl StockView {
    fn from_row(entry: stock::Model, material: Option<material::Model>) -> Self {
        let (name, unit) = material
            .map(|m| (m.name, m.unit))
            .unwrap_or_default();
        Self {
            id: entry.id,
            material_id: entry.material_id,
            name,
            unit,
            quantity: entry.quantity,
        }
    }
}

/// Adds `delta` to the material's stock row, creating the row when missing.
///
/// The increment is a single relative `UPDATE` so concurrent writers cannot
/// lose each other's changes. Must run inside the caller's transaction for
/// the strict policy check to roll back cleanly.
pub(crate) async fn apply_stock_delta<C>(
    conn: &C,
    material_id: i32,
    delta: Decimal,
    policy: StockPolicy,
) -> Result<stock::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let updated = StockEntity::update_many()
        .col_expr(
            stock::Column::Quantity,
            Expr::col(stock::Column::Quantity).add(delta),
        )
        .filter(stock::Column::MaterialId.eq(material_id))
        .exec(conn)
        .await?;

    let entry = if updated.rows_affected == 0 {
        debug!(material_id, "No stock row yet, inserting one");
        stock::ActiveModel {
            material_id: Set(material_id),
            quantity: Set(delta),
            ..Default::default()
        }
        .insert(conn)
        .await?
    } else {
        StockEntity::find()
            .filter(stock::Column::MaterialId.eq(material_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "stock row for material {} vanished after update",
                    material_id
                ))
            })?
    };

    if entry.quantity < Decimal::ZERO {
        if !policy.allow_negative {
            counter!("stockbook.stock.rejected_oversell", 1);
            return Err(ServiceError::InsufficientStock(format!(
                "material {} would drop to {}",
                material_id, entry.quantity
            )));
        }
        warn!(material_id, quantity = %entry.quantity, "Stock is negative");
    }

    Ok(entry)
}

/// Service for stock levels
#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DbPool>,
    policy: StockPolicy,
}

impl StockService {
    pub fn new(db_pool: Arc<DbPool>, policy: StockPolicy) -> Self {
        Self { db_pool, policy }
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    #[instrument(skip(self))]
    pub async fn list_stock(&self) -> Result<Vec<StockView>, ServiceError> {
        let rows = StockEntity::find()
            .find_also_related(MaterialEntity)
            .order_by_asc(stock::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(entry, material)| StockView::from_row(entry, material))
            .collect())
    }

    #[instrument(skip(self), fields(stock_id = %id))]
    pub async fn get_stock(&self, id: i32) -> Result<StockView, ServiceError> {
        StockEntity::find_by_id(id)
            .find_also_related(MaterialEntity)
            .one(&*self.db_pool)
            .await?
            .map(|(entry, material)| StockView::from_row(entry, material))
            .ok_or_else(|| ServiceError::not_found("stock entry", id))
    }

    /// Posts a signed quantity for a material and returns the stock row id.
    #[instrument(skip(self, request), fields(material_id = %request.material_id, quantity = %request.quantity))]
    pub async fn post_stock(&self, request: PostStockRequest) -> Result<i32, ServiceError> {
        let policy = self.policy;
        let PostStockRequest {
            material_id,
            quantity,
        } = request;

        let entry = with_transaction::<_, _, ServiceError>(&self.db_pool, "post_stock", move |txn| {
            Box::pin(async move {
                if MaterialEntity::find_by_id(material_id).one(txn).await?.is_none() {
                    return Err(ServiceError::not_found("material", material_id));
                }
                apply_stock_delta(txn, material_id, quantity, policy).await
            })
        })
        .await?;

        info!(stock_id = entry.id, quantity = %entry.quantity, "Stock posted");
        Ok(entry.id)
    }

    #[instrument(skip(self), fields(stock_id = %id))]
    pub async fn delete_stock(&self, id: i32) -> Result<u64, ServiceError> {
        let result = StockEntity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("stock entry", id));
        }
        info!("Stock entry deleted");
        Ok(result.rows_affected)
    }
}
