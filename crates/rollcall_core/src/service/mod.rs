//! Core use-case services.
//!
//! # Responsibility
//! - Validate candidates before any storage access.
//! - Enforce email uniqueness with a pre-write lookup and apply creation
//!   defaults.
//! - Classify every failure into exactly one [`ErrorKind`].
//!
//! # Invariants
//! - The pre-write uniqueness check is not atomic against concurrent writers;
//!   the storage unique constraint is the backstop and maps to `Conflict`.
//! - Delete performs no existence check.

pub mod church_member_service;
pub mod user_service;

use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use serde::Serialize;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Structural rule violated; caller-fixable.
    Validation,
    /// Write rejected by a uniqueness rule.
    Conflict,
    /// Required row does not exist.
    NotFound,
    /// Storage failure not classified above.
    Persistence,
}

/// Error returned by every service operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{field} already exists")]
    Conflict { field: &'static str },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Persistence(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            // Only `email` carries a unique constraint in this schema.
            RepoError::UniqueViolation { .. } => Self::Conflict { field: "email" },
            other => Self::Persistence(other),
        }
    }
}
