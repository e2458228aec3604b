use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use tracing::{field, Instrument, Level};
use url::Url;

use crate::domain::error::StoreError;

/// Shared reqwest wrapper for every store adapter: attaches credentials,
/// wraps each call in an `outgoing_http` span and maps HTTP failures onto
/// [`StoreError`].
#[derive(Clone)]
pub struct StoreClient {
    inner: reqwest::Client,
    service_key: String,
}

/// Status and raw body of a response that passed the status check.
pub(crate) struct StoreResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl StoreClient {
    pub fn new(service_key: impl Into<String>, connect_timeout: Duration) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build store HTTP client")?;
        Ok(Self::from_client(inner, service_key))
    }

    pub fn from_client(inner: reqwest::Client, service_key: impl Into<String>) -> Self {
        Self {
            inner,
            service_key: service_key.into(),
        }
    }

    /// Request authorized with the privileged service key.
    pub(crate) fn service_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.request_as(method, url, &self.service_key)
    }

    /// Request authorized as the end user owning `bearer`.
    pub(crate) fn request_as(&self, method: Method, url: Url, bearer: &str) -> RequestBuilder {
        let mut rb = self.inner.request(method, url);
        if !self.service_key.is_empty() {
            if let Ok(key) = HeaderValue::from_str(&self.service_key) {
                rb = rb.header("apikey", key);
            }
        }
        if !bearer.is_empty() {
            rb = rb.header(AUTHORIZATION, format!("Bearer {bearer}"));
        }
        rb
    }

    /// Send the request; any non-2xx status becomes an error.
    pub(crate) async fn execute(&self, rb: RequestBuilder) -> Result<StoreResponse, StoreError> {
        let resp = self.send(rb).await?;
        check_status(resp.status, &resp.body)?;
        Ok(resp)
    }

    /// Send the request and return the response whatever its status.
    pub(crate) async fn send(&self, rb: RequestBuilder) -> Result<StoreResponse, StoreError> {
        let req = rb
            .build()
            .map_err(|e| StoreError::Malformed(format!("invalid request: {e}")))?;

        let span = tracing::span!(
            Level::INFO,
            "outgoing_http",
            http.method = %req.method(),
            http.url = %redacted(req.url()),
            http.status_code = field::Empty,
            error = field::Empty,
        );

        async {
            let resp = self
                .inner
                .execute(req)
                .await
                .map_err(|e| StoreError::Unavailable(transport_message(&e)))?;

            let status = resp.status();
            let span = tracing::Span::current();
            span.record("http.status_code", status.as_u16());
            if status.is_client_error() || status.is_server_error() {
                span.record("error", true);
            }

            let body = resp
                .bytes()
                .await
                .map_err(|e| StoreError::Unavailable(transport_message(&e)))?
                .to_vec();
            Ok::<_, StoreError>(StoreResponse { status, body })
        }
        .instrument(span)
        .await
    }
}

/// Append path segments to a base URL, keeping the base path.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, StoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StoreError::Malformed(format!("invalid base URL '{base}'")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map an HTTP status onto the store error taxonomy.
pub(crate) fn check_status(status: StatusCode, body: &[u8]) -> Result<(), StoreError> {
    if status.is_success() {
        return Ok(());
    }
    let message = provider_message(status, body);
    Err(match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::Unavailable(message)
        }
        s if s.is_server_error() => StoreError::Unavailable(message),
        s => StoreError::Rejected {
            status: s.as_u16(),
            message,
        },
    })
}

/// Best human-readable message in an error body.
pub(crate) fn provider_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(serde_json::Value::String(s)) = map.get(key) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
    }
    let raw = String::from_utf8_lossy(body).trim().to_string();
    if raw.is_empty() {
        format!("HTTP {status}")
    } else {
        raw
    }
}

fn transport_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

fn redacted(url: &Url) -> String {
    let mut u = url.clone();
    u.set_query(None);
    u.to_string()
}
