//! sea-orm entities for the six stockbook tables.

pub mod customer;
pub mod material;
pub mod order;
pub mod order_item;
pub mod stock;
pub mod usage;
