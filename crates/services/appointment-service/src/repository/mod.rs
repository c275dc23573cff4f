//! Repository layer for data access.

pub mod entities;
mod appointment_repository;

pub use appointment_repository::{AppointmentFilter, AppointmentRepository, AppointmentStore};

#[cfg(any(test, feature = "test-utils"))]
pub use appointment_repository::MockAppointmentRepository;
