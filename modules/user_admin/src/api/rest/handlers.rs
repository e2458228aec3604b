use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderMap},
    Extension, Json,
};
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::api::rest::dto::{DeleteUserReq, DeleteUserResponse, ErrorBody};
use crate::api::rest::error::{internal_error, map_domain_error, ErrorResponse};
use crate::contract::model::CallerContext;
use crate::domain::service::Service;

/// Permanently delete a user from the record store and the identity store
#[utoipa::path(
    delete,
    path = "/admin/users",
    tag = "users",
    request_body = DeleteUserReq,
    responses(
        (status = 200, description = "Identity deleted; `record` reports the application-record step", body = DeleteUserResponse),
        (status = 400, description = "User ID is required", body = ErrorBody),
        (status = 401, description = "Caller identity could not be established", body = ErrorBody),
        (status = 403, description = "Not an administrative origin or caller is not an admin", body = ErrorBody),
        (status = 500, description = "Identity deletion failed or internal error", body = ErrorBody)
    )
)]
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    headers: HeaderMap,
    body: Result<Json<DeleteUserReq>, JsonRejection>,
) -> Result<Json<DeleteUserResponse>, ErrorResponse> {
    let raw_id = match body {
        Ok(Json(req)) => req.user_id.unwrap_or_default(),
        Err(rejection) => {
            debug!(%rejection, "Unreadable delete request body");
            String::new()
        }
    };
    let caller = caller_context_from_headers(&headers);
    info!(user_id = %raw_id, "Delete user requested");

    match AssertUnwindSafe(svc.delete_user(&raw_id, &caller))
        .catch_unwind()
        .await
    {
        Ok(Ok(report)) => Ok(Json(DeleteUserResponse::from(report))),
        Ok(Err(e)) => {
            let resp = map_domain_error(&e);
            if resp.status.is_server_error() {
                error!(user_id = %raw_id, "Failed to delete user: {}", e);
            } else {
                warn!(user_id = %raw_id, "Delete user refused: {}", e);
            }
            Err(resp)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(user_id = %raw_id, "Delete user handler panicked: {}", message);
            Err(internal_error(message))
        }
    }
}

/// Referrer (falling back to `Origin`) and bearer token of the request.
pub fn caller_context_from_headers(headers: &HeaderMap) -> CallerContext {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let origin = header_str(header::REFERER)
        .or_else(|| header_str(header::ORIGIN))
        .map(str::to_owned);

    let access_token = header_str(header::AUTHORIZATION)
        .and_then(|v| {
            let (scheme, token) = v.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    CallerContext::new(origin, access_token)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
