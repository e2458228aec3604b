use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::rest::dto::ErrorBody;
use crate::domain::error::{DomainError, ForbiddenReason};

/// HTTP status plus JSON error body.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, body: ErrorBody) -> Self {
        Self { status, body }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Map domain error to the HTTP error response
pub fn map_domain_error(e: &DomainError) -> ErrorResponse {
    match e {
        DomainError::InvalidRequest { message } => {
            ErrorResponse::new(StatusCode::BAD_REQUEST, ErrorBody::new(message.clone()))
        }
        DomainError::Forbidden {
            reason: ForbiddenReason::Origin,
        } => ErrorResponse::new(StatusCode::FORBIDDEN, ErrorBody::new("Access denied")),
        DomainError::Forbidden {
            reason: ForbiddenReason::NotAdmin { role },
        } => ErrorResponse::new(
            StatusCode::FORBIDDEN,
            ErrorBody::new("Admin access required").with_role(role.clone()),
        ),
        DomainError::Unauthorized { .. } => {
            ErrorResponse::new(StatusCode::UNAUTHORIZED, ErrorBody::new("Unauthorized"))
        }
        DomainError::AuthDeletionFailed { error } => ErrorResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("Failed to delete from authentication system")
                .with_details(error.to_string()),
        ),
        DomainError::Internal { message } => internal_error(message.clone()),
    }
}

pub fn internal_error(details: impl Into<String>) -> ErrorResponse {
    ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::new("Internal server error").with_details(details),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::StoreError;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        let cases = [
            (DomainError::missing_user_id(), StatusCode::BAD_REQUEST),
            (DomainError::forbidden_origin(), StatusCode::FORBIDDEN),
            (DomainError::not_admin(None), StatusCode::FORBIDDEN),
            (DomainError::unauthorized("no token"), StatusCode::UNAUTHORIZED),
            (
                DomainError::auth_deletion_failed(StoreError::NotFound("not found".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (DomainError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(map_domain_error(&err).status, status, "{err:?}");
        }
    }

    #[test]
    fn auth_failure_carries_provider_detail() {
        let resp = map_domain_error(&DomainError::auth_deletion_failed(StoreError::NotFound(
            "not found".into(),
        )));
        assert_eq!(
            resp.body,
            ErrorBody::new("Failed to delete from authentication system").with_details("not found")
        );
    }

    #[test]
    fn unauthorized_body_hides_the_reason() {
        let resp = map_domain_error(&DomainError::unauthorized("token rejected by store"));
        assert_eq!(resp.body, ErrorBody::new("Unauthorized"));
    }
}
