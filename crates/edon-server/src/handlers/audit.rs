// crates/edon-server/src/handlers/audit.rs
// ============================================================================
// Module: Audit Handlers
// Description: `GET /decisions/query` (aliased as `GET /audit/query`) and
// `GET /decisions/{id}` — read access to the tenant's audit trail.
// Purpose: Let an operator or agent inspect past verdicts without direct
// store access.
// Dependencies: edon-core, edon-store-sqlite, edon-pipeline
// ============================================================================

//! ## Overview
//! The store only indexes audit rows by tenant, `action_id`, and a
//! result-count limit; it has no column for `agent_id` or `verdict`, so
//! those two filters are applied in-memory after the store's bounded
//! query returns. `intent_id` is not stored on [`edon_core::AuditEvent`]
//! at all (an event references the action it governed, not the intent
//! that happened to be active at the time), so a caller that supplies it
//! gets a `400` rather than a filter that silently does nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use edon_core::AuditEvent;
use edon_core::DecisionId;
use edon_core::GatewayError;
use edon_core::ReasonCode;
use edon_core::Verdict;
use edon_pipeline::EndpointClass;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::error::from_store_error;
use crate::pipeline::PreambleOptions;
use crate::pipeline::record_success;
use crate::pipeline::run_preamble;
use crate::request::build_incoming_request;
use crate::state::AppContext;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    action_id: Option<String>,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    verdict: Option<Verdict>,
    #[serde(default)]
    intent_id: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct AuditQueryResponse {
    events: Vec<AuditEvent>,
}

fn validated_limit(requested: Option<u32>) -> Result<u32, ApiError> {
    let limit = requested.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ApiError::new(GatewayError::InvalidRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        ))));
    }
    Ok(limit)
}

/// Handles `GET /decisions/query` and its `GET /audit/query` alias.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, `400` for an
/// out-of-range `limit` or an unsupported `intent_id` filter, or a store
/// failure.
pub async fn query(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/decisions/query", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    if query.intent_id.is_some() {
        return Err(ApiError::new(GatewayError::InvalidRequest(
            "filtering audit events by intent_id is not supported".to_string(),
        )));
    }
    let limit = validated_limit(query.limit)?;

    let mut events = ctx
        .store
        .query_audit_events(auth.tenant_id, query.action_id.as_deref(), limit)
        .map_err(|err| ApiError::new(from_store_error(err)))?;

    if let Some(agent_id) = &query.agent_id {
        events.retain(|event| event.agent_id.as_ref().is_some_and(|id| id.as_str() == agent_id));
    }
    if let Some(verdict) = query.verdict {
        events.retain(|event| event.decision.verdict == verdict);
    }
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(AuditQueryResponse { events })).into_response())
}

/// Handles `GET /decisions/{id}`.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, a store failure, or
/// `404` when the decision doesn't exist or belongs to another tenant.
pub async fn get(State(ctx): State<Arc<AppContext>>, headers: HeaderMap, Path(id): Path<String>) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/decisions/id", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let decision_id: DecisionId = serde_json::from_value(Value::String(id.clone()))
        .map_err(|err| ApiError::new(GatewayError::InvalidRequest(format!("invalid decision id: {err}"))))?;
    let event = ctx
        .store
        .get_audit_event(&decision_id)
        .map_err(|err| ApiError::new(from_store_error(err)))?
        .filter(|event| event.tenant_id == auth.tenant_id)
        .ok_or_else(|| ApiError::new(GatewayError::NotFound(format!("decision {id} not found"))))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(event)).into_response())
}

const AGGREGATE_WINDOW_LIMIT: u32 = 1000;

/// One UTC day's verdict counts.
#[derive(Debug, Default, Serialize)]
struct DayBucket {
    allow: u64,
    block: u64,
    escalate: u64,
    degrade: u64,
    pause: u64,
    error: u64,
}

impl DayBucket {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Allow => self.allow += 1,
            Verdict::Block => self.block += 1,
            Verdict::Escalate => self.escalate += 1,
            Verdict::Degrade => self.degrade += 1,
            Verdict::Pause => self.pause += 1,
            Verdict::Error => self.error += 1,
        }
    }
}

fn day_bucket_key(event: &AuditEvent) -> String {
    event.decided_at.to_rfc3339().get(..10).unwrap_or_default().to_string()
}

#[derive(Debug, Serialize)]
struct TimeseriesPoint {
    day: String,
    #[serde(flatten)]
    counts: DayBucket,
}

#[derive(Debug, Serialize)]
struct TimeseriesResponse {
    points: Vec<TimeseriesPoint>,
}

/// Handles `GET /timeseries`, bucketing the tenant's most recent audit
/// events (bounded by [`AGGREGATE_WINDOW_LIMIT`]) into per-day verdict
/// counts.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble or a store failure.
pub async fn timeseries(State(ctx): State<Arc<AppContext>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/timeseries", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let events = ctx
        .store
        .query_audit_events(auth.tenant_id, None, AGGREGATE_WINDOW_LIMIT)
        .map_err(|err| ApiError::new(from_store_error(err)))?;

    let mut buckets: BTreeMap<String, DayBucket> = BTreeMap::new();
    for event in &events {
        buckets.entry(day_bucket_key(event)).or_default().record(event.decision.verdict);
    }
    let points = buckets.into_iter().map(|(day, counts)| TimeseriesPoint { day, counts }).collect();
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(TimeseriesResponse { points })).into_response())
}

#[derive(Debug, Serialize)]
struct BlockReasonCount {
    reason_code: ReasonCode,
    count: u64,
}

#[derive(Debug, Serialize)]
struct BlockReasonsResponse {
    reasons: Vec<BlockReasonCount>,
}

/// Handles `GET /block-reasons`, counting `ReasonCode` occurrences among
/// the tenant's `BLOCK` verdicts in the same recent window `/timeseries`
/// draws from.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble or a store failure.
pub async fn block_reasons(State(ctx): State<Arc<AppContext>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/block-reasons", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let events = ctx
        .store
        .query_audit_events(auth.tenant_id, None, AGGREGATE_WINDOW_LIMIT)
        .map_err(|err| ApiError::new(from_store_error(err)))?;

    // `ReasonCode` has no `Ord`/`Hash` impl (it's a small, closed wire enum,
    // not a map key anywhere else in the gateway), so counts are tallied in
    // a plain `Vec` rather than a `BTreeMap`/`HashMap`.
    let mut counts: Vec<(ReasonCode, u64)> = Vec::new();
    for event in &events {
        if event.decision.verdict != Verdict::Block {
            continue;
        }
        let reason_code = event.decision.reason_code;
        match counts.iter_mut().find(|(code, _)| *code == reason_code) {
            Some((_, count)) => *count += 1,
            None => counts.push((reason_code, 1)),
        }
    }
    let reasons = counts.into_iter().map(|(reason_code, count)| BlockReasonCount { reason_code, count }).collect();
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(BlockReasonsResponse { reasons })).into_response())
}
