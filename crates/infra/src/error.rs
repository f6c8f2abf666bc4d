//! Application-level error model.

use thiserror::Error;

use stockyard_core::DomainError;

use crate::repository::StoreError;

/// Error returned by the application services.
///
/// Combines deterministic domain failures with store failures so the HTTP
/// layer can map each category to one status code.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected at the boundary (bad amount, unknown reference, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The addressed record does not exist.
    #[error("not found")]
    NotFound,

    /// The request conflicts with stored state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store failed.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}
