use std::sync::Arc;

use axum::{routing::delete, Extension, Router};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

/// Path the OpenAPI document is generated for.
const DOCUMENTED_ROUTE: &str = "/admin/users";

#[derive(OpenApi)]
#[openapi(
    paths(handlers::delete_user),
    components(schemas(
        dto::DeleteUserReq,
        dto::DeleteUserResponse,
        dto::RecordStatusDto,
        dto::ErrorBody
    )),
    tags((name = "users", description = "Administrative user management"))
)]
pub struct ApiDoc;

/// Mount the delete endpoint at `route`.
pub fn register_routes(router: Router, service: Arc<Service>, route: &str) -> Router {
    let users = Router::new()
        .route(route, delete(handlers::delete_user))
        .layer(Extension(service));
    router.merge(users)
}

/// OpenAPI document with the delete operation keyed under `route`.
pub fn openapi(route: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if route != DOCUMENTED_ROUTE {
        if let Some(item) = doc.paths.paths.remove(DOCUMENTED_ROUTE) {
            doc.paths.paths.insert(route.to_string(), item);
        }
    }
    doc
}
