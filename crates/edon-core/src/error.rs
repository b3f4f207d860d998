// crates/edon-core/src/error.rs
// ============================================================================
// Module: Gateway Errors
// Description: The closed error-kind set surfaced to every EDON crate,
// with an HTTP status mapping for the server layer.
// Purpose: Give connectors, the store, the evaluator and the pipeline one
// vocabulary for what can go wrong, so the server maps every crate's
// failures to a response without re-deriving status codes at call sites.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! `GatewayError` is the error type every other EDON crate converts its
//! own, more specific error enum into at its public boundary. The
//! variant set is closed: a new failure mode gets a new variant here,
//! never a stringly-typed catch-all, so `status_code` stays exhaustive.

use thiserror::Error;

/// Errors surfaced across the EDON gateway's crate boundaries.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The caller's credentials did not authenticate.
    #[error("authentication failed: {0}")]
    Unauthenticated(String),
    /// The caller authenticated but is not permitted to perform this action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// The request body failed schema or structural validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The caller exceeded a rate limit window.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    /// The requested resource does not exist (or is not visible to this tenant).
    #[error("not found: {0}")]
    NotFound(String),
    /// A credential lookup found no matching row for this tenant.
    #[error("no credential {credential_id} for tenant {tenant_id}")]
    CredentialNotFound {
        /// Credential identifier that was looked up.
        credential_id: String,
        /// Tenant the lookup was scoped to.
        tenant_id: String,
    },
    /// A connector could not complete the requested operation.
    #[error("connector failure: {0}")]
    Connector(String),
    /// The persistence layer failed.
    #[error("store failure: {0}")]
    Store(String),
    /// The MAG decision ledger rejected or could not validate an action.
    #[error("mag validation failed: {0}")]
    MagValidation(String),
    /// An internal invariant was violated; this should never be reachable
    /// from caller input alone.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Maps this error to the HTTP status code the server layer returns.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) => 403,
            Self::InvalidRequest(_) => 400,
            Self::RateLimited(_) => 429,
            Self::NotFound(_) | Self::CredentialNotFound { .. } => 404,
            Self::Connector(_) | Self::MagValidation(_) => 502,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns a caller-safe detail string, with host paths and
    /// tracebacks redacted.
    #[must_use]
    pub fn safe_detail(&self) -> String {
        crate::core::summary::redact_detail(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429() {
        assert_eq!(GatewayError::RateLimited("too many requests".to_string()).status_code(), 429);
    }

    #[test]
    fn credential_not_found_maps_to_404() {
        let error =
            GatewayError::CredentialNotFound { credential_id: "x".to_string(), tenant_id: "y".to_string() };
        assert_eq!(error.status_code(), 404);
    }
}
