// crates/edon-pipeline/src/error.rs
// ============================================================================
// Module: Pipeline Errors
// Description: The rejection type every pipeline stage returns when a
// request fails its check, with an HTTP status mapping.
// Purpose: Give edon-server one closed vocabulary for "which stage
// rejected this request and what should the client see," instead of each
// stage inventing its own error shape.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// A rejection raised by one pipeline stage before the handler runs.
///
/// # Invariants
/// - `detail()` never includes a filesystem path or the word "traceback";
///   callers should still run it through [`edon_core::redact_detail`] at
///   the response boundary as a second line of defense.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No credential matched; caller is unauthenticated.
    #[error("authentication failed: {0}")]
    Unauthenticated(String),
    /// Authenticated but the tenant's subscription is not active.
    #[error("subscription inactive: {0}")]
    SubscriptionInactive(String),
    /// The caller exceeded a rate limit window.
    #[error("rate limit exceeded: {0}")]
    RateLimited {
        /// Human-readable detail.
        detail: String,
        /// Seconds until the violated window resets.
        retry_after_secs: u64,
    },
    /// The request body failed structural validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// MAG ledger validation rejected or could not reach the action.
    #[error("mag validation failed: {0}")]
    MagRejected(String),
    /// An internal failure prevented the pipeline from reaching a verdict
    /// on whether the request may proceed.
    #[error("internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Maps this rejection to the HTTP status code `edon-server` returns.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::SubscriptionInactive(_) => 402,
            Self::RateLimited { .. } => 429,
            Self::InvalidRequest(_) => 400,
            Self::MagRejected(_) => 403,
            Self::Internal(_) => 500,
        }
    }

    /// Returns a caller-safe detail string.
    #[must_use]
    pub fn safe_detail(&self) -> String {
        edon_core::redact_detail(&self.to_string())
    }
}
