use super::{
    checked_total, ensure_positive, line_total, stock::apply_stock_delta, stock::StockPolicy,
};
use crate::{
    db::{with_transaction, DbPool},
    entities::{
        customer::Entity as CustomerEntity,
        material::Entity as MaterialEntity,
        order::{self, Entity as OrderEntity},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: i32,
    #[validate(length(min = 1, message = "an order needs at least one item"))]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub material_id: i32,
    #[schema(value_type = f64, example = 2)]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub material_id: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    /// Line total at the unit price in force when the order was placed
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            material_id: model.material_id,
            quantity: model.quantity,
            price: model.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub customer_id: i32,
    pub created_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    fn assemble(order: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            created_at: order.created_at,
            total: order.total,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

struct PricedLine {
    material_id: i32,
    quantity: Decimal,
    price: Decimal,
}

/// Runs the whole order inside the caller's transaction: price lookup,
/// order and item inserts, then one stock decrement per line.
async fn place_order<C>(
    conn: &C,
    request: CreateOrderRequest,
    policy: StockPolicy,
) -> Result<OrderResponse, ServiceError>
where
    C: ConnectionTrait,
{
    let customer_id = request.customer_id;
    if CustomerEntity::find_by_id(customer_id).one(conn).await?.is_none() {
        return Err(ServiceError::not_found("customer", customer_id));
    }

    let mut lines = Vec::with_capacity(request.items.len());
    for item in request.items {
        let material = MaterialEntity::find_by_id(item.material_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("material", item.material_id))?;
        lines.push(PricedLine {
            material_id: material.id,
            quantity: item.quantity,
            price: line_total(material.price, item.quantity)?,
        });
    }
    let total = checked_total(lines.iter().map(|line| line.price))?;

    let order = order::ActiveModel {
        customer_id: Set(customer_id),
        created_at: Set(Utc::now()),
        total: Set(total),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            material_id: Set(line.material_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        items.push(item);
    }

    for line in &lines {
        apply_stock_delta(conn, line.material_id, -line.quantity, policy).await?;
    }

    Ok(OrderResponse::assemble(order, items))
}

/// Service for customer orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    policy: StockPolicy,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, policy: StockPolicy) -> Self {
        Self { db_pool, policy }
    }

    /// Places an order atomically. Any failure leaves no order rows and
    /// unchanged stock.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, lines = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for (index, item) in request.items.iter().enumerate() {
            ensure_positive(&format!("items[{}].quantity", index), item.quantity)?;
        }

        let policy = self.policy;
        let start = std::time::Instant::now();
        let result = with_transaction::<_, _, ServiceError>(&self.db_pool, "create_order", move |txn| {
            Box::pin(async move { place_order(txn, request, policy).await })
        })
        .await;
        histogram!("stockbook.orders.create_duration", start.elapsed());

        match result {
            Ok(order) => {
                counter!("stockbook.orders.created", 1);
                info!(order_id = order.id, total = %order.total, "Order created");
                Ok(order)
            }
            Err(e) => {
                counter!("stockbook.orders.failed", 1);
                error!(error = %e, "Order creation failed");
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: i32) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", id))?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?;
        Ok(OrderResponse::assemble(order, items))
    }

    /// Every order with its items, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let orders = OrderEntity::find()
            .order_by_desc(order::Column::Id)
            .all(db)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: BTreeMap<i32, Vec<order_item::Model>> = BTreeMap::new();
        for item in OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(ids))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?
        {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderResponse::assemble(order, items)
            })
            .collect())
    }
}
