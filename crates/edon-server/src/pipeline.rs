// crates/edon-server/src/pipeline.rs
// ============================================================================
// Module: Request Pipeline Wiring
// Description: Runs the ordered pre-handler stages (size check, auth, MAG,
// rate limit, body validation) a governed or write-path handler needs
// before it touches the store or a connector.
// Purpose: Keep the stage order in one place so every handler runs the
// same sequence spec.md names, instead of re-deriving it per route.
// Dependencies: edon-core, edon-config, edon-pipeline
// ============================================================================

//! ## Overview
//! [`run_preamble`] runs `RequestIdAndSecurityHeaders → Authentication →
//! MagValidation → RateLimit → Validation`, stopping at the first stage
//! that rejects. It does not run the handler itself and does not record
//! rate-limit usage: [`record_success`] does that, called by the route
//! only after the handler produced a 2xx response, matching invariant 8
//! (spec.md §8) that failed requests never consume quota.

use edon_pipeline::EndpointClass;
use edon_pipeline::IncomingRequest;
use edon_pipeline::RateLimiter;
use edon_pipeline::auth;
use edon_pipeline::auth::AuthOutcome;
use edon_pipeline::validation;
use serde_json::Value;

use crate::error::ApiError;
use crate::error::from_pipeline_error;
use crate::state::AppContext;

/// Options controlling which optional stages [`run_preamble`] runs.
pub struct PreambleOptions {
    /// Whether the MAG pre-authorization check applies to this endpoint.
    pub requires_mag: bool,
    /// The already-parsed JSON body to structurally validate, if any.
    pub body: Option<Value>,
}

/// Runs every pre-handler stage in order, returning the resolved caller
/// identity on success.
///
/// # Errors
///
/// Returns [`ApiError`] from whichever stage first rejects the request.
pub async fn run_preamble(
    ctx: &AppContext,
    request: &IncomingRequest,
    class: EndpointClass,
    options: PreambleOptions,
) -> Result<AuthOutcome, ApiError> {
    validation::check_content_length(request.content_length)
        .map_err(|detail| ApiError::new(edon_core::GatewayError::InvalidRequest(detail)))?;

    let outcome = auth::authenticate(request, &ctx.store, &ctx.jwks, &ctx.config.auth, ctx.config.server.mode, &ctx.clock)
        .await
        .map_err(|err| ApiError::new(from_pipeline_error(err)))?;

    if options.requires_mag {
        ctx.mag
            .validate(request.decision_id.as_deref(), request.decision_bundle.as_ref())
            .await
            .map_err(|err| ApiError::new(from_pipeline_error(err)))?;
    }

    if ctx.config.flags.rate_limit_enabled {
        let limiter = RateLimiter::new(&ctx.store, ctx.config.rate_limit, &ctx.clock);
        limiter
            .check(request.rate_limit_subject(), class)
            .map_err(|err| ApiError::new(from_pipeline_error(err)))?;
    }

    if let Some(body) = &options.body {
        validation::validate_json(body, ctx.config.flags.strict_validation)
            .map_err(|detail| ApiError::new(edon_core::GatewayError::InvalidRequest(detail)))?;
    }

    Ok(outcome)
}

/// Records rate-limit usage for `subject` after a 2xx response. Failures
/// here are logged, not surfaced, since the caller has already received a
/// successful response and the quota write is best-effort bookkeeping.
pub fn record_success(ctx: &AppContext, subject: &str, class: EndpointClass) {
    if !ctx.config.flags.rate_limit_enabled {
        return;
    }
    let limiter = RateLimiter::new(&ctx.store, ctx.config.rate_limit, &ctx.clock);
    if let Err(err) = limiter.record(subject, class) {
        tracing::warn!(subject, error = %err, "failed to record rate limit usage");
    }
}
