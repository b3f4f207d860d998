// crates/edon-server/src/handlers/intent.rs
// ============================================================================
// Module: Intent Handlers
// Description: `POST /intent/set` and `GET /intent/get` — read/write the
// tenant's single active intent contract.
// Purpose: Let a tenant hand-author scope and constraints directly,
// alongside the named-preset shortcut in `handlers::policy_packs`.
// Dependencies: edon-core, edon-pipeline
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use edon_core::Constraints;
use edon_core::GatewayError;
use edon_core::IntentContract;
use edon_core::IntentId;
use edon_core::RiskLevel;
use edon_core::ScopeEntry;
use edon_core::WorkHours;
use edon_pipeline::EndpointClass;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::error::from_store_error;
use crate::pipeline::PreambleOptions;
use crate::pipeline::record_success;
use crate::pipeline::run_preamble;
use crate::request::build_incoming_request;
use crate::state::AppContext;

fn default_risk_level() -> RiskLevel {
    RiskLevel::Low
}

#[derive(Debug, Deserialize)]
struct SetIntentRequest {
    objective: String,
    #[serde(default)]
    scope: Vec<ScopeEntry>,
    #[serde(default)]
    constraints: Constraints,
    #[serde(default)]
    work_hours: Option<WorkHours>,
    /// The risk level the tenant is declaring this intent at.
    #[serde(default = "default_risk_level")]
    risk_level: RiskLevel,
    /// Whether the tenant pre-approves `High`-risk actions under this
    /// intent, letting them skip the usual `ESCALATE`.
    #[serde(default)]
    approved_by_user: bool,
}

/// Handles `POST /intent/set`, fully replacing the tenant's prior contract.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, an invalid body, or a
/// store failure.
pub async fn set_intent(State(ctx): State<Arc<AppContext>>, headers: HeaderMap, Json(body): Json<Value>) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/intent/set", None);
    let auth =
        run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: Some(body.clone()) }).await?;

    let request: SetIntentRequest = serde_json::from_value(body)
        .map_err(|err| ApiError::new(GatewayError::InvalidRequest(format!("invalid intent request body: {err}"))))?;

    let intent = IntentContract {
        id: IntentId::new(),
        tenant_id: auth.tenant_id,
        objective: request.objective,
        scope: request.scope,
        constraints: request.constraints,
        work_hours: request.work_hours,
        risk_level: request.risk_level,
        approved_by_user: request.approved_by_user,
        created_at: ctx.clock.now(),
    };
    ctx.store.set_intent(&intent).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(intent)).into_response())
}

/// Handles `GET /intent/get`.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, a store failure, or
/// `404` when the tenant has never set an intent.
pub async fn get_intent(State(ctx): State<Arc<AppContext>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/intent/get", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let intent = ctx
        .store
        .get_intent(auth.tenant_id)
        .map_err(|err| ApiError::new(from_store_error(err)))?
        .ok_or_else(|| ApiError::new(GatewayError::NotFound("no intent set for this tenant".to_string())))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(intent)).into_response())
}
