// crates/edon-server/src/handlers/integrations.rs
// ============================================================================
// Module: Integration Handlers
// Description: `/integrations/clawdbot/connect`, `/integrations/channel-binding`,
// `/integrations/connect-code`, and the OAuth begin/callback pair —
// onboarding flows that provision credentials or auth material rather
// than governing an action.
// Purpose: Give a tenant ways to hand the gateway a secret (a Clawdbot
// bearer token, a channel binding, a one-shot connect code) without
// routing those calls through the action evaluator, matching how
// `/credentials/set` itself is ungoverned.
// Dependencies: edon-core, edon-store-sqlite, edon-pipeline, uuid
// ============================================================================

//! ## Overview
//! `clawdbot/connect` and `channel-binding` are solidly grounded: the
//! first is a thin wrapper over [`edon_store_sqlite::SqliteStore::set_credential`]
//! with the tool fixed to Clawdbot, the second over `upsert_channel_token`
//! with a freshly minted raw token hashed before storage and returned to
//! the caller exactly once. `connect-code` has no dedicated store table;
//! it reuses [`edon_core::ApiKeyRecord`] as a one-shot API key, since a
//! connect code and an API key are the same shape (a hashed bearer
//! secret resolving to a tenant) and the store already knows how to look
//! one up. The OAuth begin/callback pair is the weakest-grounded piece
//! here: nothing in this workspace's config carries OAuth client
//! settings, so both handlers return `501` rather than pretending to
//! implement a flow with no redirect URI, client id, or token exchange
//! to drive it.

use std::sync::Arc;

use axum::Json;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use edon_core::ApiKeyId;
use edon_core::ApiKeyRecord;
use edon_core::ChannelTokenId;
use edon_core::ChannelTokenRecord;
use edon_core::Credential;
use edon_core::CredentialKey;
use edon_core::GatewayError;
use edon_core::hash_token;
use edon_pipeline::EndpointClass;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::credentials;
use crate::error::ApiError;
use crate::error::from_store_error;
use crate::pipeline::PreambleOptions;
use crate::pipeline::record_success;
use crate::pipeline::run_preamble;
use crate::request::build_incoming_request;
use crate::state::AppContext;

fn mint_raw_token() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Deserialize)]
struct ConnectClawdbotRequest {
    bearer_token: String,
}

#[derive(Debug, Serialize)]
struct ConnectClawdbotResponse {
    credential_id: String,
}

/// Handles `POST /integrations/clawdbot/connect`, storing the tenant's
/// Clawdbot bearer token under the configured default credential id.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble, an invalid body, or
/// a store failure.
pub async fn clawdbot_connect(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/integrations/clawdbot/connect", None);
    let auth =
        run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: Some(body.clone()) }).await?;

    let request: ConnectClawdbotRequest = serde_json::from_value(body)
        .map_err(|err| ApiError::new(GatewayError::InvalidRequest(format!("invalid clawdbot connect body: {err}"))))?;

    let clawdbot_default = ctx.config.connectors.clawdbot.as_ref().map_or_else(String::new, |c| c.default_credential_id.clone());
    let credential_id = credentials::credential_id_for(edon_core::Tool::Clawdbot, None, &clawdbot_default);
    let credential = Credential {
        key: CredentialKey::new(credential_id.clone().into(), Some(auth.tenant_id)),
        tool: "clawdbot".to_string(),
        data: serde_json::json!({ "bearer_token": request.bearer_token }),
        updated_at: ctx.clock.now(),
    };
    ctx.store.set_credential(&credential).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(ConnectClawdbotResponse { credential_id })).into_response())
}

#[derive(Debug, Serialize)]
struct ChannelBindingResponse {
    token_id: String,
    token: String,
}

/// Handles `POST /integrations/channel-binding`, minting a fresh raw
/// token for the authenticated tenant and persisting only its hash. The
/// raw token is returned exactly once; it cannot be recovered afterward.
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble or a store failure.
pub async fn channel_binding(State(ctx): State<Arc<AppContext>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/integrations/channel-binding", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let raw_token = mint_raw_token();
    let token_id = ChannelTokenId::new(Uuid::new_v4().to_string());
    let record = ChannelTokenRecord {
        id: token_id.clone(),
        tenant_id: auth.tenant_id,
        token_hash: hash_token(&raw_token),
        created_at: ctx.clock.now(),
        active: true,
    };
    ctx.store.upsert_channel_token(&record).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(ChannelBindingResponse { token_id: token_id.to_string(), token: raw_token })).into_response())
}

#[derive(Debug, Serialize)]
struct ConnectCodeResponse {
    key_id: String,
    code: String,
}

/// Handles `POST /integrations/connect-code`, minting a one-shot API key
/// for the authenticated tenant (used to bind a new client, e.g. a CLI
/// install, without hand-crafting an API key record directly).
///
/// # Errors
///
/// Returns [`ApiError`] from the pipeline preamble or a store failure.
pub async fn connect_code(State(ctx): State<Arc<AppContext>>, headers: HeaderMap) -> Result<Response, ApiError> {
    let incoming = build_incoming_request(&headers, "/integrations/connect-code", None);
    let auth = run_preamble(&ctx, &incoming, EndpointClass::Default, PreambleOptions { requires_mag: false, body: None }).await?;

    let raw_code = mint_raw_token();
    let key_id = ApiKeyId::new(format!("connect-{}", Uuid::new_v4()));
    let record = ApiKeyRecord {
        id: key_id.clone(),
        tenant_id: auth.tenant_id,
        token_hash: hash_token(&raw_code),
        created_at: ctx.clock.now(),
        active: true,
    };
    ctx.store.upsert_api_key(&record).map_err(|err| ApiError::new(from_store_error(err)))?;
    record_success(&ctx, incoming.rate_limit_subject(), EndpointClass::Default);

    Ok((StatusCode::OK, Json(ConnectCodeResponse { key_id: key_id.to_string(), code: raw_code })).into_response())
}

#[derive(Debug, Deserialize)]
pub struct OAuthBeginQuery {
    #[serde(default)]
    #[allow(dead_code)]
    provider: Option<String>,
}

fn oauth_not_configured() -> ApiError {
    ApiError::new(GatewayError::Internal(
        "OAuth integrations are not configured on this gateway".to_string(),
    ))
    .with_status(501)
}

/// Handles `GET /integrations/oauth/begin`. Always returns `501`: no
/// provider client id, secret, or redirect URI exists anywhere in
/// `edon_config::AppConfig` to drive a real authorization redirect.
///
/// # Errors
///
/// Always returns a `501` [`ApiError`].
pub async fn oauth_begin(
    State(_ctx): State<Arc<AppContext>>,
    Query(_query): Query<OAuthBeginQuery>,
) -> Result<Response, ApiError> {
    Err(oauth_not_configured())
}

/// Handles `GET /integrations/oauth/callback`. Always returns `501` for
/// the same reason as [`oauth_begin`].
///
/// # Errors
///
/// Always returns a `501` [`ApiError`].
pub async fn oauth_callback(State(_ctx): State<Arc<AppContext>>) -> Result<Response, ApiError> {
    Err(oauth_not_configured())
}
