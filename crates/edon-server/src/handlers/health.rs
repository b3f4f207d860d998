// crates/edon-server/src/handlers/health.rs
// ============================================================================
// Module: Health Handler
// Description: `GET /health` — the one public, unauthenticated endpoint
// reporting whether the store is reachable.
// Purpose: Give an operator or load balancer a liveness probe that does
// not require a credential, matching `decision-gate-mcp::operations`'s
// readiness check.
// Dependencies: edon-store-sqlite
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppContext;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    schema_version: i64,
    store: &'static str,
}

/// Handles `GET /health`. Never returns an error: a store ping failure is
/// reported as `store: "degraded"` in a `200` body rather than surfaced as
/// a `5xx`, so monitoring can distinguish "gateway process is up but the
/// store is unhappy" from "gateway process did not answer at all".
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<HealthResponse> {
    let store_status = if ctx.store.ping().is_ok() { "ok" } else { "degraded" };
    Json(HealthResponse { status: "ok", schema_version: ctx.store.schema_version(), store: store_status })
}
