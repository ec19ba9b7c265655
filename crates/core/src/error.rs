//! Domain error model.

use std::fmt::Display;

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Rejections raised by domain rules before anything is persisted.
///
/// Record lookups and uniqueness belong to the store; the domain only judges
/// the values it is handed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Form input out of bounds or missing.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Internal state no longer matches what it was derived from.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Text that does not parse as an identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Reject blank (empty or whitespace-only) required text fields.
pub fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Reject `value` outside `min..=max`.
pub fn require_range<T>(field: &str, value: T, min: T, max: T) -> DomainResult<()>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        return Err(DomainError::validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(())
}
