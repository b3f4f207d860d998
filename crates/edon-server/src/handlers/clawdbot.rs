// crates/edon-server/src/handlers/clawdbot.rs
// ============================================================================
// Module: Clawdbot Invoke Handler
// Description: `POST /clawdbot/invoke` (and its `/edon/invoke` alias) —
// governs and forwards a single delegated-backend call.
// Purpose: Let an agent reach the Clawdbot super-tool backend only
// through the same evaluator and audit trail every other tool goes
// through, never directly.
// Dependencies: edon-core, edon-connectors, edon-evaluator, edon-pipeline
// ============================================================================

//! ## Overview
//! Unlike `/execute`, the request body here *is* the Clawdbot call: the
//! whole JSON object (minus an optional `credential_id` field, stripped
//! before forwarding) becomes `action.params`, and the evaluator's
//! sub-tool allowlist reads `params["tool"]` straight out of it. Intent
//! resolution falls back twice: a tenant with no intent on record but an
//! applied policy pack still gets that pack's scope, and only a tenant
//! with neither falls all the way to deny-all.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use edon_core::Action;
use edon_core::ActionSource;
use edon_core::AgentId;
use edon_core::AuditEvent;
use edon_core::ExecutionOutcome;
use edon_core::GatewayError;
use edon_core::RiskLevel;
use edon_core::Tool;
use edon_core::redact_detail;
use edon_pipeline::EndpointClass;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::credentials;
use crate::error::ApiError;
use crate::error::from_connector_error;
use crate::error::from_store_error;
use crate::intents;
use crate::pipeline::PreambleOptions;
use crate::pipeline::record_success;
use crate::pipeline::run_preamble;
use crate::request::build_incoming_request;
use crate::state::AppContext;

#[derive(Debug, Serialize)]
struct DeniedResponse {
    edon_verdict: edon_core::Verdict,
    edon_explanation: String,
    decision_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalation_question: Option<String>,
}

fn extract_credential_id(body: &mut Value) -> Option<String> {
    body.as_object_mut()?.remove("credential_id")?.as_str().map(ToString::to_string)
}

/// Handles `POST /clawdbot/invoke` (and the `/edon/invoke` alias).
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, an `X-Intent-ID` that
/// doesn't match the tenant's stored intent, a store or dispatch
/// failure, or `503` when Clawdbot itself is unreachable.
pub async fn invoke(State(ctx): State<Arc<AppContext>>, headers: HeaderMap, Json(mut body): Json<Value>) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/clawdbot/invoke", None);
    let auth =
        run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: true, body: Some(body.clone()) }).await?;

    let now = ctx.clock.now();
    let tenant_id = auth.tenant_id;

    let intent = match ctx.store.get_intent(tenant_id).map_err(|err| ApiError::new(from_store_error(err)))? {
        Some(intent) => {
            if let Some(requested_intent_id) = &incoming.intent_id
                && *requested_intent_id != intent.id.to_string()
            {
                return Err(ApiError::new(GatewayError::NotFound(format!("intent {requested_intent_id} not found"))));
            }
            intent
        }
        None => match ctx.store.get_active_policy_preset(tenant_id).map_err(|err| ApiError::new(from_store_error(err)))? {
            Some(preset) => intents::intent_from_preset(tenant_id, preset, now),
            None => intents::default_deny_intent(tenant_id, now),
        },
    };

    let explicit_credential_id = extract_credential_id(&mut body);
    let agent_id = auth.agent_id.clone();
    let source = if agent_id.is_some() { ActionSource::Agent } else { ActionSource::User };
    let action = Action::new(Tool::Clawdbot, "invoke", body, now, source, RiskLevel::Medium);

    let decision = edon_evaluator::evaluate(&action, &intent, now, &ctx.history, &ctx.config.evaluator);
    ctx.metrics.record_decision(decision.verdict);

    let mut event = AuditEvent::pending(tenant_id, agent_id.map(AgentId::from), action.clone(), decision.clone(), now);

    if !decision.verdict.is_executable() {
        ctx.store.record_audit_event(&event).map_err(|err| ApiError::new(from_store_error(err)))?;
        record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);
        let response = DeniedResponse {
            edon_verdict: decision.verdict,
            edon_explanation: decision.explanation,
            decision_id: event.decision_id.to_string(),
            escalation_question: decision.escalation_question,
        };
        return Ok((StatusCode::OK, Json(response)).into_response());
    }

    let dispatch_action = decision.safe_alternative.clone().unwrap_or(action);
    let registry = ctx.connectors_for_tenant(tenant_id);
    let clawdbot_default = ctx.config.connectors.clawdbot.as_ref().map_or_else(String::new, |c| c.default_credential_id.clone());
    let credential = credentials::resolve(
        &ctx.store,
        tenant_id,
        Tool::Clawdbot,
        explicit_credential_id.as_deref(),
        &clawdbot_default,
        ctx.config.flags.credentials_strict,
    )?;

    let started = Instant::now();
    let outcome =
        registry.dispatch(&dispatch_action, credential.as_ref()).await.map_err(|err| ApiError::new(from_connector_error(err)))?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    ctx.metrics.record_connector_latency(Tool::Clawdbot.as_str(), elapsed_ms);

    if outcome.downstream_unavailable {
        let detail = outcome.error.clone().unwrap_or_else(|| "downstream unavailable".to_string());
        event = event.with_execution(ExecutionOutcome::Failed { detail: redact_detail(&detail) });
        ctx.store.record_audit_event(&event).map_err(|err| ApiError::new(from_store_error(err)))?;
        record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);
        return Err(ApiError::downstream_unavailable(detail));
    }

    let (execution, response_body) = if outcome.success {
        let result = outcome.result.unwrap_or(Value::Null);
        let detail = redact_detail(&result.to_string());
        let mut body = if result.is_object() { result } else { json!({ "result": result }) };
        if let Some(map) = body.as_object_mut() {
            map.insert("edon_verdict".to_string(), json!(decision.verdict));
            map.insert("edon_explanation".to_string(), json!(decision.explanation));
        }
        (ExecutionOutcome::Succeeded { detail }, body)
    } else {
        let detail = redact_detail(&outcome.error.unwrap_or_default());
        let body = json!({ "edon_verdict": decision.verdict, "edon_explanation": decision.explanation, "error": detail });
        (ExecutionOutcome::Failed { detail }, body)
    };
    event = event.with_execution(execution);
    ctx.store.record_audit_event(&event).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(response_body)).into_response())
}
