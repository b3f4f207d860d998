// crates/edon-server/src/error.rs
// ============================================================================
// Module: API Errors
// Description: Maps every crate's closed error vocabulary onto the
// gateway's single `{detail}` HTTP response envelope.
// Purpose: Give every handler one error type to return via `?`, and keep
// the status-code mapping in one place instead of scattered per handler.
// Dependencies: axum, edon-core, edon-pipeline, edon-connectors,
// edon-store-sqlite
// ============================================================================

//! ## Overview
//! [`ApiError`] wraps [`edon_core::GatewayError`] plus the request id the
//! request-id middleware assigned, so every error response still carries
//! an `X-Request-ID` header even on the failure path. `edon_core::GatewayError`
//! is already the crate boundary every other EDON crate converts its own
//! error enum into; the `from_*` functions here do that conversion rather
//! than implementing `From`, since neither the source error types nor
//! `GatewayError` live in this crate and the orphan rule blocks the impl.

use axum::Json;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use edon_connectors::ConnectorError;
use edon_core::GatewayError;
use edon_core::Tool;
use edon_pipeline::PipelineError;
use edon_store_sqlite::SqliteStoreError;
use serde::Serialize;

/// The gateway's single non-2xx response body shape.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// A caller-safe, redacted detail message.
    pub detail: String,
}

/// A handler-facing error carrying the request id for its response header.
///
/// `status_override` exists because `GatewayError`'s status mapping is
/// closed over the crate-boundary vocabulary (no crate this gateway
/// depends on has a reason to produce a 503): a connector reporting
/// `downstream_unavailable` is not any of `GatewayError`'s variants, it is
/// a successful dispatch whose outcome the route layer decides to answer
/// with 503 rather than invent a new cross-crate error kind for.
#[derive(Debug)]
pub struct ApiError {
    inner: GatewayError,
    request_id: Option<String>,
    status_override: Option<u16>,
}

impl ApiError {
    /// Wraps a [`GatewayError`] with no request id attached.
    #[must_use]
    pub fn new(inner: GatewayError) -> Self {
        Self { inner, request_id: None, status_override: None }
    }

    /// Attaches the request id so the response carries `X-Request-ID`.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Overrides the HTTP status this error renders as, keeping the
    /// underlying `GatewayError`'s detail message.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_override = Some(status);
        self
    }

    /// Builds the 503 a downstream-unavailable connector outcome renders
    /// as for `/execute` and `/clawdbot/invoke`.
    #[must_use]
    pub fn downstream_unavailable(detail: impl Into<String>) -> Self {
        Self::new(GatewayError::Connector(detail.into())).with_status(503)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self
            .status_override
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or_else(|| StatusCode::from_u16(self.inner.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
        let body = ErrorBody { detail: self.inner.safe_detail() };
        let mut response = (status, Json(body)).into_response();
        if let Some(request_id) = self.request_id
            && let Ok(value) = HeaderValue::from_str(&request_id)
        {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
}

/// Converts a pipeline rejection into the gateway's error vocabulary.
#[must_use]
pub fn from_pipeline_error(err: PipelineError) -> GatewayError {
    match err {
        PipelineError::Unauthenticated(detail) => GatewayError::Unauthenticated(detail),
        PipelineError::SubscriptionInactive(detail) => GatewayError::Forbidden(detail),
        PipelineError::RateLimited { detail, .. } => GatewayError::RateLimited(detail),
        PipelineError::InvalidRequest(detail) => GatewayError::InvalidRequest(detail),
        PipelineError::MagRejected(detail) => GatewayError::MagValidation(detail),
        PipelineError::Internal(detail) => GatewayError::Internal(detail),
    }
}

/// Converts a connector failure into the gateway's error vocabulary.
#[must_use]
pub fn from_connector_error(err: ConnectorError) -> GatewayError {
    match err {
        ConnectorError::Unsupported(tool) => GatewayError::InvalidRequest(format!("unsupported tool: {tool}")),
        ConnectorError::CredentialRequired(tool) => {
            GatewayError::CredentialNotFound { credential_id: tool_credential_label(tool), tenant_id: String::new() }
        }
        ConnectorError::Sandbox(detail) | ConnectorError::InvalidParams(detail) => GatewayError::Connector(detail),
    }
}

fn tool_credential_label(tool: Tool) -> String {
    format!("<any for {tool}>")
}

/// Converts a store failure into the gateway's error vocabulary.
#[must_use]
pub fn from_store_error(err: SqliteStoreError) -> GatewayError {
    match err {
        SqliteStoreError::Io(detail) | SqliteStoreError::Db(detail) => GatewayError::Store(detail),
        SqliteStoreError::Corrupt(detail) | SqliteStoreError::VersionMismatch(detail) => GatewayError::Store(detail),
        SqliteStoreError::Invalid(detail) => GatewayError::InvalidRequest(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_rate_limit_maps_to_429() {
        let mapped = from_pipeline_error(PipelineError::RateLimited { detail: "too fast".to_string(), retry_after_secs: 5 });
        assert_eq!(mapped.status_code(), 429);
    }

    #[test]
    fn connector_unsupported_maps_to_400() {
        let mapped = from_connector_error(ConnectorError::Unsupported(Tool::GitHub));
        assert_eq!(mapped.status_code(), 400);
    }

    #[test]
    fn store_db_error_maps_to_500() {
        let mapped = from_store_error(SqliteStoreError::Db("locked".to_string()));
        assert_eq!(mapped.status_code(), 500);
    }

    #[test]
    fn downstream_unavailable_renders_as_503() {
        let error = ApiError::downstream_unavailable("clawdbot backend timed out");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
