use super::{conflict_on_reference, normalize_optional, validate_not_blank};
use crate::{
    db::{with_transaction, DbPool},
    entities::{
        customer::{self, Entity as CustomerEntity},
        order::{self, Entity as OrderEntity},
        usage::{self, Entity as UsageEntity},
    },
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Acme Builders")]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CreateCustomerRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: normalize_optional(self.phone),
            email: normalize_optional(self.email),
            address: normalize_optional(self.address),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<customer::Model> for CustomerResponse {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            email: model.email,
            address: model.address,
        }
    }
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    /// Creates a new customer service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerResponse>, ServiceError> {
        let customers = CustomerEntity::find()
            .order_by_asc(customer::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(customers.into_iter().map(CustomerResponse::from).collect())
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: i32) -> Result<CustomerResponse, ServiceError> {
        CustomerEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .map(CustomerResponse::from)
            .ok_or_else(|| ServiceError::not_found("customer", id))
    }

    #[instrument(skip(self, request))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        let request = request.normalized();
        request.validate()?;

        let created = customer::ActiveModel {
            name: Set(request.name),
            phone: Set(request.phone),
            email: Set(request.email),
            address: Set(request.address),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert customer");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = created.id, "Customer created");
        Ok(created.into())
    }

    /// Deletes a customer that has no usage records or orders.
    ///
    /// The history check and the delete share one transaction.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete_customer(&self, id: i32) -> Result<u64, ServiceError> {
        let deleted = with_transaction::<_, _, ServiceError>(&self.db_pool, "delete_customer", move |txn| {
            Box::pin(async move { delete_customer_without_history(txn, id).await })
        })
        .await?;
        info!("Customer deleted");
        Ok(deleted)
    }
}

async fn delete_customer_without_history<C>(conn: &C, id: i32) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    if CustomerEntity::find_by_id(id).one(conn).await?.is_none() {
        return Err(ServiceError::not_found("customer", id));
    }

    let usage_records = UsageEntity::find()
        .filter(usage::Column::CustomerId.eq(id))
        .count(conn)
        .await?;
    let orders = OrderEntity::find()
        .filter(order::Column::CustomerId.eq(id))
        .count(conn)
        .await?;

    if usage_records > 0 || orders > 0 {
        warn!(usage_records, orders, "Refusing to delete customer with history");
        return Err(ServiceError::Conflict(format!(
            "customer {} has {} usage record(s) and {} order(s)",
            id, usage_records, orders
        )));
    }

    let result = CustomerEntity::delete_by_id(id)
        .exec(conn)
        .await
        .map_err(|e| conflict_on_reference(e, || format!("customer {} still has history", id)))?;
    Ok(result.rows_affected)
}
