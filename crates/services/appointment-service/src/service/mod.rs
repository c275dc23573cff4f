//! Service layer for business logic.

mod appointment_service;

pub use appointment_service::{AppointmentBooking, AppointmentService, BookAppointment, Removal};
