//! Business logic layer.

mod order_service;

pub use order_service::{CreateOrder, OrderFulfillment, OrderService};
