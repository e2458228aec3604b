use thiserror::Error;

use crate::contract::model::StoreErrorKind;

/// Failure reported by one of the external stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("{0}")]
    Unavailable(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Malformed(String),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::NotFound(_) => StoreErrorKind::NotFound,
            Self::Timeout { .. } => StoreErrorKind::Timeout,
            Self::Unavailable(_) => StoreErrorKind::Unavailable,
            Self::Rejected { .. } => StoreErrorKind::Rejected,
            Self::Malformed(_) => StoreErrorKind::Malformed,
        }
    }

    /// Worth another attempt: the store may answer differently next time.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable(_))
    }
}

/// Why a request was refused as forbidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The request did not come from an administrative surface.
    Origin,
    /// The caller was identified but is not an administrator.
    NotAdmin { role: Option<String> },
}

/// Domain-specific errors of the deletion workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{message}")]
    InvalidRequest { message: String },

    #[error("Forbidden: {reason:?}")]
    Forbidden { reason: ForbiddenReason },

    #[error("Caller identity could not be established: {reason}")]
    Unauthorized { reason: String },

    #[error("Failed to delete from authentication system: {error}")]
    AuthDeletionFailed { error: StoreError },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn missing_user_id() -> Self {
        Self::InvalidRequest {
            message: "User ID is required".to_string(),
        }
    }

    pub fn forbidden_origin() -> Self {
        Self::Forbidden {
            reason: ForbiddenReason::Origin,
        }
    }

    pub fn not_admin(role: Option<String>) -> Self {
        Self::Forbidden {
            reason: ForbiddenReason::NotAdmin { role },
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn auth_deletion_failed(error: StoreError) -> Self {
        Self::AuthDeletionFailed { error }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_and_unavailability_are_transient() {
        assert!(StoreError::Timeout { after_ms: 10 }.is_transient());
        assert!(StoreError::Unavailable("503".into()).is_transient());
        assert!(!StoreError::NotFound("not found".into()).is_transient());
        assert!(!StoreError::Rejected {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
        assert!(!StoreError::Malformed("eof".into()).is_transient());
    }

    #[test]
    fn store_error_display_is_the_provider_message() {
        assert_eq!(StoreError::NotFound("not found".into()).to_string(), "not found");
        assert_eq!(
            StoreError::Timeout { after_ms: 250 }.to_string(),
            "timed out after 250 ms"
        );
        assert_eq!(
            DomainError::auth_deletion_failed(StoreError::NotFound("not found".into()))
                .to_string(),
            "Failed to delete from authentication system: not found"
        );
    }
}
