//! SeaORM entities.

pub mod appointment;
