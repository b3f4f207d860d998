// crates/edon-server/src/handlers/execute.rs
// ============================================================================
// Module: Execute Handler
// Description: `POST /execute` — governs a single proposed action and, on
// an executable verdict, dispatches it to the resolved connector.
// Purpose: Implement the full pipeline → governor → connector → audit
// chain for the gateway's primary endpoint.
// Dependencies: edon-core, edon-connectors, edon-evaluator, edon-pipeline
// ============================================================================

//! ## Overview
//! `/execute` runs the shared preamble, loads the tenant's intent
//! (falling back to a deny-all contract when none is on record), builds
//! an [`Action`] from the request body, and hands both to
//! [`edon_evaluator::evaluate`]. The decision is audited unconditionally —
//! blocked and escalated actions are logged too, not only allowed ones —
//! and only an executable verdict ([`Verdict::is_executable`]) reaches a
//! connector. A connector reporting `downstream_unavailable` renders as
//! `503`, which [`GatewayError`]'s closed variant set has no slot for, so
//! this is the one place [`ApiError::downstream_unavailable`] is used
//! instead of the usual `from_connector_error` mapping.

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
use edon_core::EscalationOption;
use edon_core::ExecutionOutcome;
use edon_core::GatewayError;
use edon_core::ReasonCode;
use edon_core::RiskLevel;
use edon_core::Tool;
use edon_core::Verdict;
use edon_core::redact_detail;
use edon_pipeline::EndpointClass;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

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

fn default_estimated_risk() -> RiskLevel {
    RiskLevel::Low
}

#[derive(Debug, Deserialize)]
struct ActionInput {
    tool: Tool,
    op: String,
    #[serde(default)]
    params: Value,
    #[serde(default = "default_estimated_risk")]
    estimated_risk: RiskLevel,
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    action: ActionInput,
    #[serde(default)]
    intent_id: Option<String>,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    credential_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExecuteResponse {
    verdict: Verdict,
    decision_id: String,
    reason_code: ReasonCode,
    explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    safe_alternative: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalation_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalation_options: Option<Vec<EscalationOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution: Option<ExecutionOutcome>,
    timestamp: String,
}

/// Truncates and redacts a connector result for audit storage; full
/// payloads are never persisted, only a bounded, sanitized summary.
fn summarize_result(result: Option<&Value>) -> String {
    const MAX_LEN: usize = 2_000;
    let raw = result.map(ToString::to_string).unwrap_or_default();
    let redacted = redact_detail(&raw);
    if redacted.len() > MAX_LEN { format!("{}...", &redacted[..MAX_LEN]) } else { redacted }
}

/// Handles `POST /execute`.
///
/// # Errors
///
/// Returns [`ApiError`] from any pipeline preamble stage, from an invalid
/// body, from a store failure, from an unsupported or credential-less
/// connector dispatch, or a `503` when the dispatched connector reports
/// the downstream as unavailable.
pub async fn execute(State(ctx): State<Arc<AppContext>>, headers: HeaderMap, Json(body): Json<Value>) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/execute", None);
    let auth =
        run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: true, body: Some(body.clone()) }).await?;

    let request: ExecuteRequest = serde_json::from_value(body)
        .map_err(|err| ApiError::new(GatewayError::InvalidRequest(format!("invalid execute request body: {err}"))))?;

    let now = ctx.clock.now();
    let tenant_id = auth.tenant_id;

    let intent = match ctx.store.get_intent(tenant_id).map_err(|err| ApiError::new(from_store_error(err)))? {
        Some(intent) => intent,
        None => intents::default_deny_intent(tenant_id, now),
    };
    if let Some(requested_intent_id) = &request.intent_id
        && *requested_intent_id != intent.id.to_string()
    {
        return Err(ApiError::new(GatewayError::NotFound(format!("intent {requested_intent_id} not found"))));
    }

    let agent_id = request.agent_id.or(auth.agent_id);
    let source = if agent_id.is_some() { ActionSource::Agent } else { ActionSource::User };
    let action = Action::new(request.action.tool, request.action.op, request.action.params, now, source, request.action.estimated_risk);

    let decision = edon_evaluator::evaluate(&action, &intent, now, &ctx.history, &ctx.config.evaluator);
    ctx.metrics.record_decision(decision.verdict);

    let mut event = AuditEvent::pending(tenant_id, agent_id.map(AgentId::from), action.clone(), decision.clone(), now);

    let execution = if decision.verdict.is_executable() {
        let dispatch_action = decision.safe_alternative.clone().unwrap_or_else(|| action.clone());
        let registry = ctx.connectors_for_tenant(tenant_id);
        let clawdbot_default =
            ctx.config.connectors.clawdbot.as_ref().map_or_else(String::new, |c| c.default_credential_id.clone());
        let credential = credentials::resolve(
            &ctx.store,
            tenant_id,
            dispatch_action.tool,
            request.credential_id.as_deref(),
            &clawdbot_default,
            ctx.config.flags.credentials_strict,
        )?;

        let started = Instant::now();
        let outcome =
            registry.dispatch(&dispatch_action, credential.as_ref()).await.map_err(|err| ApiError::new(from_connector_error(err)))?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        ctx.metrics.record_connector_latency(dispatch_action.tool.as_str(), elapsed_ms);

        if outcome.downstream_unavailable {
            let detail = outcome.error.clone().unwrap_or_else(|| "downstream unavailable".to_string());
            event = event.with_execution(ExecutionOutcome::Failed { detail: redact_detail(&detail) });
            ctx.store.record_audit_event(&event).map_err(|err| ApiError::new(from_store_error(err)))?;
            record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);
            return Err(ApiError::downstream_unavailable(detail));
        }

        let outcome_exec = if outcome.success {
            ExecutionOutcome::Succeeded { detail: summarize_result(outcome.result.as_ref()) }
        } else {
            ExecutionOutcome::Failed { detail: redact_detail(&outcome.error.unwrap_or_default()) }
        };
        event = event.with_execution(outcome_exec.clone());
        Some(outcome_exec)
    } else {
        None
    };

    ctx.store.record_audit_event(&event).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    let response = ExecuteResponse {
        verdict: decision.verdict,
        decision_id: event.decision_id.to_string(),
        reason_code: decision.reason_code,
        explanation: decision.explanation,
        safe_alternative: decision.safe_alternative,
        escalation_question: decision.escalation_question,
        escalation_options: decision.escalation_options,
        execution,
        timestamp: now.to_rfc3339(),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
