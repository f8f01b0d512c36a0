//! User-visible failure outcomes.
//!
//! Storage operations return `anyhow::Result`; when a failure is something the
//! caller should see (missing record, duplicate, permission), the error inside
//! the `anyhow::Error` is a [`DomainError`]. The HTTP layer downcasts to pick a
//! status code and sanitizes everything else.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Invalid(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Find the [`DomainError`] carried by an `anyhow::Error`, if any.
pub fn domain_error(err: &anyhow::Error) -> Option<&DomainError> {
    err.downcast_ref::<DomainError>()
}
