use super::{checked_total, ensure_positive, line_total};
use crate::{
    db::{with_transaction, DbPool},
    entities::{
        customer::Entity as CustomerEntity,
        material::{self, Entity as MaterialEntity},
        usage::{self, Entity as UsageEntity},
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordUsageRequest {
    pub customer_id: i32,
    pub material_id: i32,
    #[schema(value_type = f64, example = 3)]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsageRecordResponse {
    pub id: i32,
    pub customer_id: i32,
    pub material_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    /// Total charged, fixed at the price in force when recorded
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl From<usage::Model> for UsageRecordResponse {
    fn from(model: usage::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            material_id: model.material_id,
            quantity: model.quantity,
            price: model.price,
        }
    }
}

/// Usage record joined with the material it consumed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsageView {
    pub id: i32,
    pub material_id: i32,
    pub name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl UsageView {
    fn from_row(record: usage::Model, material: Option<material::Model>) -> Self {
        let (name, unit) = material.map(|m| (m.name, m.unit)).unwrap_or_default();
        Self {
            id: record.id,
            material_id: record.material_id,
            name,
            unit,
            quantity: record.quantity,
            price: record.price,
        }
    }
}

/// Running bill for one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsageSummary {
    pub customer_id: i32,
    pub records: usize,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
}

/// Service for per-customer material usage
#[derive(Clone)]
pub struct UsageService {
    db_pool: Arc<DbPool>,
}

impl UsageService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Records usage priced at the material's current unit price.
    ///
    /// Stock is not touched; only orders consume stock.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, material_id = %request.material_id))]
    pub async fn record_usage(
        &self,
        request: RecordUsageRequest,
    ) -> Result<UsageRecordResponse, ServiceError> {
        ensure_positive("quantity", request.quantity)?;
        let RecordUsageRequest {
            customer_id,
            material_id,
            quantity,
        } = request;

        let record = with_transaction::<_, _, ServiceError>(&self.db_pool, "record_usage", move |txn| {
            Box::pin(async move {
                if CustomerEntity::find_by_id(customer_id).one(txn).await?.is_none() {
                    return Err(ServiceError::not_found("customer", customer_id));
                }
                let material = MaterialEntity::find_by_id(material_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("material", material_id))?;

                let total = line_total(material.price, quantity)?;

                let record = usage::ActiveModel {
                    customer_id: Set(customer_id),
                    material_id: Set(material_id),
                    quantity: Set(quantity),
                    price: Set(total),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Ok(record)
            })
        })
        .await?;

        info!(usage_id = record.id, price = %record.price, "Usage recorded");
        Ok(record.into())
    }

    /// Lists a customer's usage, oldest first. Unknown customers have none.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_for_customer(&self, customer_id: i32) -> Result<Vec<UsageView>, ServiceError> {
        let rows = UsageEntity::find()
            .filter(usage::Column::CustomerId.eq(customer_id))
            .find_also_related(MaterialEntity)
            .order_by_asc(usage::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(record, material)| UsageView::from_row(record, material))
            .collect())
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn summarize_for_customer(&self, customer_id: i32) -> Result<UsageSummary, ServiceError> {
        let records = self.list_for_customer(customer_id).await?;
        let total = checked_total(records.iter().map(|r| r.price))?;
        Ok(UsageSummary {
            customer_id,
            records: records.len(),
            total,
        })
    }
}
