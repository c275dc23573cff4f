//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

use rust_decimal::Decimal;

// =============================================================================
// Roles
// =============================================================================

/// Wire name of the administrator role
pub const ROLE_ADMIN: &str = "ADMIN";

/// Wire name of the customer role
pub const ROLE_CUSTOMER: &str = "CLIENTE";

/// Alternative spelling accepted for the customer role
pub const ROLE_CUSTOMER_ALIAS: &str = "CUSTOMER";

// =============================================================================
// Authentication
// =============================================================================

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// Default JWT token expiration in hours
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

// =============================================================================
// Scheduling
// =============================================================================

/// First bookable hour of the day
pub const FIRST_SLOT_HOUR: u32 = 8;

/// Last bookable hour of the day (inclusive)
pub const LAST_SLOT_HOUR: u32 = 17;

/// Surcharge applied to pick-up and delivery ("telebusca") appointments
pub fn telebusca_surcharge() -> Decimal {
    Decimal::new(2000, 2)
}

// =============================================================================
// Orders
// =============================================================================

/// Maximum number of distinct products in one order
pub const MAX_ORDER_ITEMS: usize = 50;
