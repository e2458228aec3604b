//! HTTP host for the admin console: owns the listener, the shared middleware
//! stack and the process-wide endpoints (`/health`, `/openapi.json`).
//! Feature modules contribute their routes as a plain `axum::Router`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
pub mod shutdown;
mod web;

pub use config::ApiIngressConfig;

/// Main API ingress: assembles module routes behind the common middleware
/// stack and serves them until cancelled.
#[derive(Debug, Clone, Default)]
pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Build the full router: host endpoints + module routes + middleware.
    ///
    /// Middleware, outermost to innermost:
    /// SetRequestId -> PropagateRequestId -> Trace -> push_req_id_to_extensions
    /// -> Timeout -> BodyLimit (-> CORS when enabled)
    pub fn build_router(
        &self,
        module_routes: Router,
        openapi: Option<utoipa::openapi::OpenApi>,
    ) -> Router {
        tracing::debug!("Building ingress router");
        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .merge(module_routes);

        if self.config.enable_docs {
            match openapi {
                Some(doc) => {
                    let doc = Arc::new(doc);
                    router = router.route(
                        "/openapi.json",
                        get(move || {
                            let doc = doc.clone();
                            async move { axum::Json((*doc).clone()) }
                        }),
                    );
                    tracing::info!("OpenAPI document exposed at /openapi.json");
                }
                None => tracing::warn!("enable_docs is set but no OpenAPI document was supplied"),
            }
        }

        router = router.fallback(web::not_found);

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        // Each `layer` call re-wraps the router in a `Route`, so every
        // middleware sees `Request<Body>` / `Response<Body>`.
        // Added innermost first.
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));
        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            self.config.request_timeout_sec,
        )));
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = self
            .config
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.config.bind_addr))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);
        Ok(listener)
    }

    /// Serve `router` on `listener` until `cancel` fires, then drain gracefully.
    pub async fn serve(
        listener: TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}
