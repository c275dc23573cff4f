//! HTTP handlers.

pub mod appointment_handler;
pub mod health_handler;

pub use appointment_handler::{appointment_routes, slot_routes};
pub use health_handler::health_routes;
