// crates/edon-server/src/handlers/policy_packs.rs
// ============================================================================
// Module: Policy Pack Handlers
// Description: `GET /policy-packs` and `POST /policy-packs/{pack}/apply` —
// list and apply the named preset intent contracts.
// Purpose: Give a tenant a one-call way to adopt a pre-built posture
// instead of hand-authoring scope and constraints via `/intent/set`.
// Dependencies: edon-core, edon-pipeline
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use edon_core::GatewayError;
use edon_core::IntentContract;
use edon_core::PolicyPackName;
use edon_pipeline::EndpointClass;
use serde::Serialize;

use crate::error::ApiError;
use crate::error::from_store_error;
use crate::intents;
use crate::pipeline::PreambleOptions;
use crate::pipeline::record_success;
use crate::pipeline::run_preamble;
use crate::request::build_incoming_request;
use crate::state::AppContext;

#[derive(Debug, Serialize)]
struct PolicyPackSummary {
    name: &'static str,
    scope: Vec<edon_core::ScopeEntry>,
    work_hours: Option<edon_core::WorkHours>,
}

#[derive(Debug, Serialize)]
struct PolicyPackListResponse {
    packs: Vec<PolicyPackSummary>,
}

/// Handles `GET /policy-packs`, listing every preset's name, scope, and
/// work-hours window without requiring a tenant to apply one first.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble.
pub async fn list_policy_packs(State(ctx): State<Arc<AppContext>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/policy-packs", None);
    run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let packs = PolicyPackName::all()
        .into_iter()
        .map(|preset| PolicyPackSummary { name: preset.as_str(), scope: preset.scope(), work_hours: preset.work_hours() })
        .collect();
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(PolicyPackListResponse { packs })).into_response())
}

/// Handles `POST /policy-packs/{pack}/apply`, replacing the tenant's
/// active intent with the named preset's contract and recording it as
/// the tenant's active preset.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, `404` when `pack`
/// names no known preset, or a store failure.
pub async fn apply_policy_pack(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(pack): Path<String>,
) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/policy-packs/apply", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let preset = PolicyPackName::parse(&pack)
        .ok_or_else(|| ApiError::new(GatewayError::NotFound(format!("unknown policy pack: {pack}"))))?;

    let now = ctx.clock.now();
    let intent: IntentContract = intents::intent_from_preset(auth.tenant_id, preset, now);
    ctx.store.set_intent(&intent).map_err(|err| ApiError::new(from_store_error(err)))?;
    ctx.store.set_active_policy_preset(auth.tenant_id, preset).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(intent)).into_response())
}
