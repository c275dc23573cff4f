//! Common utilities shared across the pet-shop services.
//!
//! This crate provides:
//! - Unified error handling with HTTP conversion
//! - Configuration structures
//! - The authorization gate and token service
//! - Shared axum extractors
//! - Database connection and migration helpers (feature `database`)

pub mod auth;
pub mod config;
#[cfg(feature = "database")]
pub mod db;
pub mod error;
pub mod http;

pub use auth::{AuthorizationGate, TokenService, TokenVerification};
pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
