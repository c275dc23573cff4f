//! Errors raised by entities when a request breaks a business rule.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// The entity's current state does not allow the operation
    #[error("{0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
