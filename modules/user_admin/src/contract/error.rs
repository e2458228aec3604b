use thiserror::Error;

use crate::contract::model::StoreErrorKind;
use crate::domain::error::{DomainError, ForbiddenReason};

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserAdminError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Access denied")]
    AccessDenied,

    #[error("Admin access required")]
    AdminRequired { role: Option<String> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Failed to delete from authentication system: {details}")]
    AuthDeletionFailed {
        kind: StoreErrorKind,
        details: String,
    },

    #[error("Internal error")]
    Internal,
}

impl From<DomainError> for UserAdminError {
    fn from(domain_error: DomainError) -> Self {
        use DomainError::*;
        match domain_error {
            InvalidRequest { message } => Self::InvalidRequest { message },
            Forbidden {
                reason: ForbiddenReason::Origin,
            } => Self::AccessDenied,
            Forbidden {
                reason: ForbiddenReason::NotAdmin { role },
            } => Self::AdminRequired { role },
            Unauthorized { .. } => Self::Unauthorized,
            AuthDeletionFailed { error } => Self::AuthDeletionFailed {
                kind: error.kind(),
                details: error.to_string(),
            },
            Internal { .. } => Self::Internal,
        }
    }
}
