//! # DomainError
//!
//! Centralized error handling for the community board.
//! Every port returns this type; adapters convert their library errors into it
//! and the API layer maps each variant to an HTTP status.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or malformed input (e.g., blank title, bad email)
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid session, or rejected credentials
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but not allowed to touch the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource absent or soft-deleted
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Resource already exists (e.g., duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, hashing failed)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound(entity, id.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for community board logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity_and_id() {
        let err = DomainError::not_found("Board", 42);
        assert_eq!(err.to_string(), "Board not found with ID 42");
    }

    #[test]
    fn internal_wraps_display() {
        let err = DomainError::internal("pool timed out");
        assert_eq!(err, DomainError::Internal("pool timed out".into()));
    }
}
