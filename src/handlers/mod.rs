use crate::{
    db::DbPool,
    services::{
        customers::CustomerService, materials::MaterialService, orders::OrderService,
        stock::{StockPolicy, StockService},
        usage::UsageService,
    },
};
use std::sync::Arc;

pub mod common;
pub mod customers;
pub mod materials;
pub mod orders;
pub mod stock;
pub mod usage;

pub use crate::AppState;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<CustomerService>,
    pub materials: Arc<MaterialService>,
    pub stock: Arc<StockService>,
    pub usage: Arc<UsageService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, policy: StockPolicy) -> Self {
        Self {
            customers: Arc::new(CustomerService::new(db_pool.clone())),
            materials: Arc::new(MaterialService::new(db_pool.clone())),
            stock: Arc::new(StockService::new(db_pool.clone(), policy)),
            usage: Arc::new(UsageService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool, policy)),
        }
    }
}
