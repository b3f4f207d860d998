// crates/edon-server/src/handlers/credentials.rs
// ============================================================================
// Module: Credential Handlers
// Description: `POST /credentials/set`, `GET /credentials`, and
// `DELETE /credentials/{id}` — tenant-scoped credential management.
// Purpose: Let a tenant provision and revoke the secrets connectors draw
// on without ever reading them back.
// Dependencies: edon-core
// ============================================================================

//! ## Overview
//! `GET /credentials` is not named in the endpoint table this crate was
//! built against, but [`edon_store_sqlite::SqliteStore::credential_summaries`]
//! already exists and a tenant has no other way to see what credential
//! ids it has provisioned, so it is added here as a natural read-only
//! counterpart to `set`/`delete`.

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use edon_core::Credential;
use edon_core::CredentialId;
use edon_core::CredentialKey;
use edon_core::CredentialSummary;
use edon_core::GatewayError;
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

#[derive(Debug, Deserialize)]
struct SetCredentialRequest {
    credential_id: String,
    tool: String,
    data: Value,
}

#[derive(Debug, Serialize)]
struct CredentialListResponse {
    credentials: Vec<CredentialSummary>,
}

/// Handles `POST /credentials/set`, inserting or replacing the named
/// credential for the authenticated tenant.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, an invalid body, or
/// a store failure (including an oversized `data` payload).
pub async fn set(State(ctx): State<Arc<AppContext>>, headers: HeaderMap, Json(body): Json<Value>) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/credentials/set", None);
    let auth =
        run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: Some(body.clone()) }).await?;

    let request: SetCredentialRequest = serde_json::from_value(body)
        .map_err(|err| ApiError::new(GatewayError::InvalidRequest(format!("invalid credential request body: {err}"))))?;

    let credential = Credential {
        key: CredentialKey::new(CredentialId::new(request.credential_id), Some(auth.tenant_id)),
        tool: request.tool,
        data: request.data,
        updated_at: ctx.clock.now(),
    };
    ctx.store.set_credential(&credential).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(CredentialSummary::from(&credential))).into_response())
}

/// Handles `GET /credentials`, listing summaries (never secret data) for
/// the authenticated tenant.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble or a store failure.
pub async fn list(State(ctx): State<Arc<AppContext>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/credentials", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let credentials =
        ctx.store.credential_summaries(auth.tenant_id).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(CredentialListResponse { credentials })).into_response())
}

/// Handles `DELETE /credentials/{id}`.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble or a store failure.
/// Deleting a credential id that doesn't exist is not an error: the
/// store's `DELETE` is unconditional, matching ordinary idempotent
/// delete semantics.
pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(credential_id): Path<String>,
) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/credentials/id", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let key = CredentialKey::new(CredentialId::new(credential_id), Some(auth.tenant_id));
    ctx.store.delete_credential(&key).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok(StatusCode::NO_CONTENT.into_response())
}
