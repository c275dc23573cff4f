//! HTTP handlers.

pub mod health_handler;
pub mod order_handler;

pub use health_handler::health_routes;
pub use order_handler::order_routes;
