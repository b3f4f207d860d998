// crates/edon-server/src/handlers/metrics.rs
// ============================================================================
// Module: Metrics Handlers
// Description: `GET /metrics` (Prometheus text) and `GET /metrics/trust-spec`
// (JSON) — read-only views over `crate::metrics::Metrics`.
// Purpose: Expose the in-process counters without pulling in a metrics
// client crate the workspace doesn't otherwise need.
// Dependencies: axum
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppContext;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

fn metrics_disabled() -> ApiError {
    ApiError::new(edon_core::GatewayError::Internal("metrics reporting is disabled".to_string())).with_status(503)
}

/// Handles `GET /metrics`.
///
/// # Errors
///
/// Returns a `503` [`ApiError`] when `metrics.enabled` is false.
pub async fn metrics(State(ctx): State<Arc<AppContext>>) -> Result<Response, ApiError> {
    if !ctx.config.metrics.enabled {
        return Err(metrics_disabled());
    }
    let body = ctx.metrics.render_prometheus();
    Ok((StatusCode::OK, [(axum::http::header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response())
}

/// Handles `GET /metrics/trust-spec`.
///
/// # Errors
///
/// Returns a `503` [`ApiError`] when `metrics.enabled` is false.
pub async fn trust_spec(State(ctx): State<Arc<AppContext>>) -> Result<Response, ApiError> {
    if !ctx.config.metrics.enabled {
        return Err(metrics_disabled());
    }
    Ok((StatusCode::OK, Json(ctx.metrics.render_trust_spec_json())).into_response())
}
