//! Transaction helper used by every multi-statement write.
//!
//! The closure runs against a [`DatabaseTransaction`]; returning `Err` rolls
//! everything back and hands the error to the caller unchanged.

use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, warn};

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// Commits when the closure returns `Ok`, rolls back otherwise. Domain errors
/// keep their variant; connection failures are converted through `From<DbErr>`.
///
/// ```rust,ignore
/// let order = with_transaction(&db, "place_order", move |txn| {
///     Box::pin(async move {
///         let order = insert_order(txn, &request).await?;
///         apply_stock_delta(txn, material_id, -quantity, policy).await?;
///         Ok(order)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(
    db: &DatabaseConnection,
    operation: &'static str,
    f: F,
) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + From<DbErr> + Send,
{
    let start = Instant::now();
    debug!(operation, "Starting database transaction");
    counter!("stockbook_db.transaction.started", 1, "operation" => operation);

    let result = db.transaction::<F, T, E>(f).await;

    let elapsed = start.elapsed();
    histogram!("stockbook_db.transaction.duration", elapsed, "operation" => operation);

    match result {
        Ok(value) => {
            counter!("stockbook_db.transaction.committed", 1, "operation" => operation);
            debug!(operation, "Transaction committed in {:?}", elapsed);
            Ok(value)
        }
        Err(err) => {
            counter!("stockbook_db.transaction.rolled_back", 1, "operation" => operation);
            let err = match err {
                TransactionError::Connection(db_err) => E::from(db_err),
                TransactionError::Transaction(e) => e,
            };
            warn!(operation, error = %err, "Transaction rolled back after {:?}", elapsed);
            Err(err)
        }
    }
}
