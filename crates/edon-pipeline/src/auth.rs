// crates/edon-pipeline/src/auth.rs
// ============================================================================
// Module: Authentication
// Description: Resolves an inbound request's bearer credential to a tenant,
// in the fixed fallback order the gateway commits to.
// Purpose: Keep the token-resolution order, and its security posture (fail
// closed, hash comparisons only, no cross-tenant fallback), in one place
// rather than scattered across handlers.
// Dependencies: edon-core, edon-config, edon-store-sqlite
// ============================================================================

//! ## Overview
//! Resolution order is fixed: active API-key hash, then active
//! channel-token hash, then a JWKS-verified session JWT (creating the user
//! and tenant on first sight), then — only outside production, or when
//! explicitly re-enabled — an environment-provided token. The first match
//! wins; a mismatch at every stage is `401`. A match against a tenant whose
//! [`edon_core::TenantStatus`] is `Inactive` is `402`, mirroring
//! `decision-gate-mcp::auth::AuthContext`'s method-tagged outcome.

use std::env;

use edon_config::AuthConfig;
use edon_config::ServerMode;
use edon_core::SharedClock;
use edon_core::Tenant;
use edon_core::TenantId;
use edon_core::TenantStatus;
use edon_core::User;
use edon_core::hash_token;
use edon_store_sqlite::SqliteStore;

use crate::error::PipelineError;
use crate::jwks::JwksCache;
use crate::request::IncomingRequest;

const ENV_TOKEN_VAR: &str = "EDON_ENV_TOKEN";
const ENV_TENANT_VAR: &str = "EDON_ENV_TENANT_ID";

/// Which stage of the resolution order produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// An active API-key hash matched.
    ApiKey,
    /// An active channel-token hash matched.
    ChannelToken,
    /// A JWKS-verified session JWT matched.
    SessionJwt,
    /// The environment-token development fallback matched.
    EnvToken,
}

/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// Tenant the caller authenticated as.
    pub tenant_id: TenantId,
    /// Which stage resolved the credential.
    pub method: AuthMethod,
    /// Agent identifier supplied on the request, if any.
    pub agent_id: Option<String>,
}

/// Returns whether `path` is reachable without authentication.
#[must_use]
pub fn is_public_path(path: &str, public_paths: &[String]) -> bool {
    public_paths.iter().any(|allowed| allowed == path)
}

/// Resolves `req`'s bearer credential to a tenant, trying each
/// authentication method in the gateway's fixed fallback order.
///
/// # Errors
///
/// Returns [`PipelineError::Unauthenticated`] when no stage matches, and
/// [`PipelineError::SubscriptionInactive`] when the matched tenant's
/// status is not [`TenantStatus::Active`].
pub async fn authenticate(
    req: &IncomingRequest,
    store: &SqliteStore,
    jwks: &JwksCache,
    config: &AuthConfig,
    mode: ServerMode,
    clock: &SharedClock,
) -> Result<AuthOutcome, PipelineError> {
    let resolved = resolve_credential(req, store, jwks, config, mode, clock).await?;
    let tenant = store
        .get_tenant(resolved.tenant_id)
        .map_err(|err| PipelineError::Internal(err.to_string()))?
        .ok_or_else(|| PipelineError::Unauthenticated("tenant not found".to_string()))?;
    if tenant.status != TenantStatus::Active {
        return Err(PipelineError::SubscriptionInactive(format!("tenant {} is inactive", tenant.id)));
    }
    Ok(resolved)
}

async fn resolve_credential(
    req: &IncomingRequest,
    store: &SqliteStore,
    jwks: &JwksCache,
    config: &AuthConfig,
    mode: ServerMode,
    clock: &SharedClock,
) -> Result<AuthOutcome, PipelineError> {
    let agent_id = req.agent_id.clone();

    if let Some(token) = req.supplied_token() {
        let hash = hash_token(token);

        if let Some(tenant_id) =
            store.find_tenant_by_api_key_hash(&hash).map_err(|err| PipelineError::Internal(err.to_string()))?
        {
            return Ok(AuthOutcome { tenant_id, method: AuthMethod::ApiKey, agent_id });
        }

        if let Some(tenant_id) = store
            .find_tenant_by_channel_token_hash(&hash)
            .map_err(|err| PipelineError::Internal(err.to_string()))?
        {
            return Ok(AuthOutcome { tenant_id, method: AuthMethod::ChannelToken, agent_id });
        }

        if config.jwks_url.is_some()
            && let Some(claims) = jwks.verify(token).await?
        {
            let tenant_id = provision_from_claims(store, &claims, clock)?;
            return Ok(AuthOutcome { tenant_id, method: AuthMethod::SessionJwt, agent_id });
        }

        let fallback_allowed = mode != ServerMode::Production || config.allow_env_token_in_prod;
        if fallback_allowed
            && let Ok(env_token) = env::var(ENV_TOKEN_VAR)
            && !env_token.is_empty()
            && token == env_token
            && let Ok(raw_tenant_id) = env::var(ENV_TENANT_VAR)
            && let Ok(tenant_id) = raw_tenant_id.parse::<TenantId>()
        {
            return Ok(AuthOutcome { tenant_id, method: AuthMethod::EnvToken, agent_id });
        }
    }

    tracing::warn!(path = %req.path, "authentication failed: no credential matched");
    Err(PipelineError::Unauthenticated("no credential matched".to_string()))
}

/// Maps a verified JWT's `(iss, sub)` pair to an internal user and tenant,
/// creating both on first sight.
fn provision_from_claims(
    store: &SqliteStore,
    claims: &crate::jwks::SessionClaims,
    clock: &SharedClock,
) -> Result<TenantId, PipelineError> {
    let key = format!("{}:{}", claims.issuer, claims.subject);
    let tenant_id = TenantId::from_uuid(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, key.as_bytes()));
    let now = clock.now();

    if store.get_tenant(tenant_id).map_err(|err| PipelineError::Internal(err.to_string()))?.is_none() {
        let tenant = Tenant {
            id: tenant_id,
            display_name: claims.subject.clone(),
            status: TenantStatus::Active,
            created_at: now,
        };
        store.upsert_tenant(&tenant).map_err(|err| PipelineError::Internal(err.to_string()))?;
    }

    let user = User { id: edon_core::UserId::new(), tenant_id, email: claims.subject.clone(), created_at: now };
    store.upsert_user(&user).map_err(|err| PipelineError::Internal(err.to_string()))?;

    Ok(tenant_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_path_allowlist_matches_exactly() {
        let paths = vec!["/health".to_string(), "/docs".to_string()];
        assert!(is_public_path("/health", &paths));
        assert!(!is_public_path("/health/deep", &paths));
        assert!(!is_public_path("/execute", &paths));
    }
}
