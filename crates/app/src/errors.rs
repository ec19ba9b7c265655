use thiserror::Error;

use pharmabill_core::DomainError;
use pharmabill_infra::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Application-level error returned by every service call.
///
/// Maps domain errors and store errors into one shape so callers (a UI, a
/// CLI) can tell "fix your input" apart from "storage failed".
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation (deterministic; nothing was written).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage failed; the operation had no effect.
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Whether the caller can fix this by changing its input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_) | ServiceError::NotFound(_) | ServiceError::Conflict(_)
        )
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { collection, id } => {
                ServiceError::NotFound(format!("{collection} record {id}"))
            }
            StoreError::AlreadyExists { collection, id } => {
                ServiceError::Conflict(format!("{collection} record {id} already exists"))
            }
            other => ServiceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmabill_core::CatalogItemId;

    #[test]
    fn domain_validation_is_a_user_error() {
        let err = ServiceError::from(DomainError::validation("name cannot be empty"));
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "validation failed: name cannot be empty");
    }

    #[test]
    fn store_errors_keep_their_category() {
        let missing = ServiceError::from(StoreError::not_found("catalog_items", CatalogItemId::new()));
        assert!(matches!(missing, ServiceError::NotFound(_)));

        let backend = ServiceError::from(StoreError::Backend("disk full".to_string()));
        assert!(matches!(backend, ServiceError::Store(_)));
        assert!(!backend.is_user_error());
    }
}
