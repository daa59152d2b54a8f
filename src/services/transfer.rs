//! Copies every stockbook table from one database into another, keeping ids.
//!
//! Used to move an existing SQLite file into PostgreSQL. The copy is skipped
//! when the target already has customers, so re-running it is harmless.

use crate::{
    db::{with_transaction, DbPool},
    entities::{customer, material, order, order_item, stock, usage},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseBackend, EntityTrait, PaginatorTrait, QueryOrder,
    Set, Statement,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Row counts copied per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub skipped: bool,
    pub customers: usize,
    pub materials: usize,
    pub stock: usize,
    pub usage: usize,
    pub orders: usize,
    pub order_items: usize,
}

struct Snapshot {
    customers: Vec<customer::Model>,
    materials: Vec<material::Model>,
    stock: Vec<stock::Model>,
    usage: Vec<usage::Model>,
    orders: Vec<order::Model>,
    order_items: Vec<order_item::Model>,
}

async fn read_snapshot(source: &DbPool) -> Result<Snapshot, ServiceError> {
    Ok(Snapshot {
        customers: customer::Entity::find()
            .order_by_asc(customer::Column::Id)
            .all(source)
            .await?,
        materials: material::Entity::find()
            .order_by_asc(material::Column::Id)
            .all(source)
            .await?,
        stock: stock::Entity::find()
            .order_by_asc(stock::Column::Id)
            .all(source)
            .await?,
        usage: usage::Entity::find()
            .order_by_asc(usage::Column::Id)
            .all(source)
            .await?,
        orders: order::Entity::find()
            .order_by_asc(order::Column::Id)
            .all(source)
            .await?,
        order_items: order_item::Entity::find()
            .order_by_asc(order_item::Column::Id)
            .all(source)
            .await?,
    })
}

/// Rows per `INSERT`; keeps every statement well under the bind-parameter
/// limits of SQLite (32766) and PostgreSQL (65535).
pub(crate) const COPY_BATCH_SIZE: usize = 500;

async fn insert_in_batches<C, A>(conn: &C, rows: Vec<A>) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Clone + Send + Sync + 'static,
{
    for batch in rows.chunks(COPY_BATCH_SIZE) {
        <A::Entity as EntityTrait>::insert_many(batch.to_vec())
            .exec(conn)
            .await?;
    }
    Ok(())
}

async fn write_snapshot<C>(conn: &C, snapshot: Snapshot) -> Result<TransferReport, ServiceError>
where
    C: ConnectionTrait,
{
    let report = TransferReport {
        skipped: false,
        customers: snapshot.customers.len(),
        materials: snapshot.materials.len(),
        stock: snapshot.stock.len(),
        usage: snapshot.usage.len(),
        orders: snapshot.orders.len(),
        order_items: snapshot.order_items.len(),
    };

    // Parents before children so foreign keys hold at every step.
    insert_in_batches(
        conn,
        snapshot
            .customers
            .into_iter()
            .map(|m| customer::ActiveModel {
                id: Set(m.id),
                name: Set(m.name),
                phone: Set(m.phone),
                email: Set(m.email),
                address: Set(m.address),
            })
            .collect(),
    )
    .await?;
    insert_in_batches(
        conn,
        snapshot
            .materials
            .into_iter()
            .map(|m| material::ActiveModel {
                id: Set(m.id),
                name: Set(m.name),
                unit: Set(m.unit),
                price: Set(m.price),
            })
            .collect(),
    )
    .await?;
    insert_in_batches(
        conn,
        snapshot
            .stock
            .into_iter()
            .map(|m| stock::ActiveModel {
                id: Set(m.id),
                material_id: Set(m.material_id),
                quantity: Set(m.quantity),
            })
            .collect(),
    )
    .await?;
    insert_in_batches(
        conn,
        snapshot
            .usage
            .into_iter()
            .map(|m| usage::ActiveModel {
                id: Set(m.id),
                customer_id: Set(m.customer_id),
                material_id: Set(m.material_id),
                quantity: Set(m.quantity),
                price: Set(m.price),
            })
            .collect(),
    )
    .await?;
    insert_in_batches(
        conn,
        snapshot
            .orders
            .into_iter()
            .map(|m| order::ActiveModel {
                id: Set(m.id),
                customer_id: Set(m.customer_id),
                created_at: Set(m.created_at),
                total: Set(m.total),
            })
            .collect(),
    )
    .await?;
    insert_in_batches(
        conn,
        snapshot
            .order_items
            .into_iter()
            .map(|m| order_item::ActiveModel {
                id: Set(m.id),
                order_id: Set(m.order_id),
                material_id: Set(m.material_id),
                quantity: Set(m.quantity),
                price: Set(m.price),
            })
            .collect(),
    )
    .await?;

    if conn.get_database_backend() == DatabaseBackend::Postgres {
        reset_postgres_sequences(conn).await?;
    }

    Ok(report)
}

/// Explicit ids bypass PostgreSQL's serial sequences; move them past the
/// copied rows so later inserts do not collide.
async fn reset_postgres_sequences<C>(conn: &C) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    for table in ["customers", "materials", "stock", "usage", "orders", "order_items"] {
        let sql = format!(
            "SELECT setval(pg_get_serial_sequence('\"{table}\"', 'id'), COALESCE((SELECT MAX(id) FROM \"{table}\"), 0) + 1, false)"
        );
        conn.execute(Statement::from_string(DatabaseBackend::Postgres, sql))
            .await?;
    }
    Ok(())
}

/// Copies all rows from `source` into `target`, which must already be migrated.
#[instrument(skip(source, target))]
pub async fn copy_database(source: &DbPool, target: &DbPool) -> Result<TransferReport, ServiceError> {
    let existing = customer::Entity::find().count(target).await?;
    if existing > 0 {
        warn!(existing, "Target already has customers, skipping copy");
        return Ok(TransferReport {
            skipped: true,
            ..Default::default()
        });
    }

    let snapshot = read_snapshot(source).await?;
    let report = with_transaction::<_, _, ServiceError>(target, "copy_database", move |txn| {
        Box::pin(async move { write_snapshot(txn, snapshot).await })
    })
    .await?;

    info!(?report, "Copy finished");
    Ok(report)
}
