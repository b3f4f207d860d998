// crates/edon-pipeline/src/jwks.rs
// ============================================================================
// Module: JWKS Cache
// Description: Fetches and caches the session-JWT issuer's JSON Web Key
// Set, verifying bearer tokens against it by `kid`.
// Purpose: Avoid a JWKS fetch on every request while keeping concurrent
// refreshes single-flight, per the gateway's concurrency model.
// Dependencies: jsonwebtoken, reqwest, serde
// ============================================================================

//! ## Overview
//! The cache holds the JWKS document behind a `tokio::sync::Mutex` rather
//! than a `RwLock`: refresh holds the lock across the network call, so
//! concurrent callers racing a cache miss block on the same in-flight
//! fetch instead of issuing one each. `edon-core` has no JWKS-fetching
//! capability of its own; `jsonwebtoken::jwk` supplies only the key types.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::jwk::JwkSet;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::PipelineError;

/// The claims lifted out of a verified session JWT.
#[derive(Debug, Clone)]
pub struct SessionClaims {
    /// Token issuer (`iss`).
    pub issuer: String,
    /// Token subject (`sub`).
    pub subject: String,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    iss: String,
}

struct CacheState {
    keys: Option<Arc<JwkSet>>,
    fetched_at: Option<Instant>,
}

/// A single-flight, TTL-bounded cache over one issuer's JWKS document.
pub struct JwksCache {
    client: reqwest::Client,
    url: Option<String>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl JwksCache {
    /// Builds a cache for `url` (`None` disables JWT verification entirely)
    /// with the given refresh TTL.
    #[must_use]
    pub fn new(url: Option<String>, ttl_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            ttl: Duration::from_secs(ttl_secs),
            state: Mutex::new(CacheState { keys: None, fetched_at: None }),
        }
    }

    /// Verifies `token`'s signature against the cached JWKS and returns its
    /// claims. Returns `Ok(None)` when no configured key validates the
    /// token, so callers can fall through to the next auth method rather
    /// than treating a malformed JWT as a hard failure.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Internal`] when the JWKS document cannot be
    /// fetched or parsed.
    pub async fn verify(&self, token: &str) -> Result<Option<SessionClaims>, PipelineError> {
        let Ok(header) = jsonwebtoken::decode_header(token) else {
            return Ok(None);
        };
        let Some(kid) = header.kid.as_deref() else {
            return Ok(None);
        };
        let keys = self.jwk_set().await?;
        let Some(jwk) = keys.find(kid) else {
            return Ok(None);
        };
        let decoding_key = match &jwk.algorithm {
            AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|err| PipelineError::Internal(err.to_string()))?,
            AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|err| PipelineError::Internal(err.to_string()))?,
            _ => return Ok(None),
        };
        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;
        let Ok(data) = jsonwebtoken::decode::<RawClaims>(token, &decoding_key, &validation) else {
            return Ok(None);
        };
        Ok(Some(SessionClaims { issuer: data.claims.iss, subject: data.claims.sub }))
    }

    async fn jwk_set(&self) -> Result<Arc<JwkSet>, PipelineError> {
        let mut state = self.state.lock().await;
        if let (Some(keys), Some(fetched_at)) = (&state.keys, state.fetched_at)
            && fetched_at.elapsed() < self.ttl
        {
            return Ok(Arc::clone(keys));
        }
        let url = self
            .url
            .as_ref()
            .ok_or_else(|| PipelineError::Internal("jwks verification requested with no jwks_url configured".to_string()))?;
        let response = self.client.get(url).send().await.map_err(|err| PipelineError::Internal(err.to_string()))?;
        let fetched: JwkSet = response.json().await.map_err(|err| PipelineError::Internal(err.to_string()))?;
        let fetched = Arc::new(fetched);
        state.keys = Some(Arc::clone(&fetched));
        state.fetched_at = Some(Instant::now());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_rejects_without_network_access() {
        let cache = JwksCache::new(None, 600);
        let result = cache.jwk_set().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn malformed_token_resolves_to_no_match() {
        let cache = JwksCache::new(None, 600);
        let outcome = cache.verify("not-a-jwt").await.unwrap();
        assert!(outcome.is_none());
    }
}
