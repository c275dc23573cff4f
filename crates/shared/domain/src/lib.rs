//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Orders, appointments and their state machines live here, along with the
//! read models of peer-service data and the caller identity.

pub mod appointment;
pub mod constants;
pub mod error;
pub mod identity;
pub mod order;
pub mod peer;

pub use appointment::{
    appointment_total, daily_slots, free_slots, is_daily_slot, validate_service_ids, Appointment,
    AppointmentStatus, AttendanceMethod, NewAppointment, PetSize,
};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use identity::{Identity, Role};
pub use order::{
    order_total, validate_item_requests, ItemRequest, NewOrder, Order, OrderItem, OrderStatus,
    PaymentMethod,
};
pub use peer::{Customer, Pet, Product, ServiceOffering};
