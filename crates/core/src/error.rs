//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures raised by the domain primitives themselves: malformed values and
/// illegal state transitions. Business-rule rejections live with the rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier could not be parsed or was blank.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A one-way transition was attempted twice (e.g. consuming a ledger
    /// entry that is already applied).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
