//! Caller identity derived from a bearer token.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{ROLE_ADMIN, ROLE_CUSTOMER, ROLE_CUSTOMER_ALIAS};
use crate::error::DomainError;

/// Roles known to the pet shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "CLIENTE", alias = "CUSTOMER")]
    Customer,
}

impl Role {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Customer => ROLE_CUSTOMER,
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_CUSTOMER | ROLE_CUSTOMER_ALIAS => Ok(Role::Customer),
            _ => Err(DomainError::validation(format!("Unknown role '{}'", s))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated, role- and ownership-scoped view of the caller.
///
/// Built per request by the authorization gate and dropped when the request
/// completes. An invalid identity never carries a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Option<Role>,
    /// Customer id the caller acts for (customers only)
    pub owner_id: Option<i64>,
    pub valid: bool,
}

impl Identity {
    /// Identity for a request without an acceptable token.
    pub fn invalid() -> Self {
        Self {
            subject: String::new(),
            role: None,
            owner_id: None,
            valid: false,
        }
    }

    /// Identity for a verified token.
    pub fn verified(subject: impl Into<String>, role: Role, owner_id: Option<i64>) -> Self {
        Self {
            subject: subject.into(),
            role: Some(role),
            owner_id,
            valid: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.valid && matches!(self.role, Some(Role::Admin))
    }
}
