// crates/edon-server/src/middleware.rs
// ============================================================================
// Module: Request-ID and Metrics Middleware
// Description: The one `axum::middleware::from_fn_with_state` layer every
// route passes through: assigns a request id, opens a tracing span, and
// records the request/status counter on the way out.
// Purpose: Implement the `RequestIdAndSecurityHeaders` pipeline stage
// ahead of auth/rate-limit/validation, which the rest of the pipeline
// runs as plain function calls inside each handler.
// Dependencies: axum, tracing, uuid
// ============================================================================

//! ## Overview
//! Every handler response carries `X-Request-ID` (spec.md §7). This layer
//! is the one place that assigns it, rather than each handler generating
//! its own, and the one place request/status counters are recorded,
//! rather than every handler calling [`crate::metrics::Metrics::record_request`]
//! itself. Route labels are mapped from axum's matched path template
//! (`/decisions/{id}`, not the caller-supplied id) to a small closed set
//! of `&'static str`, keeping the metrics cardinality bound the way
//! [`crate::metrics::Metrics`] documents.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use crate::state::AppContext;

fn route_label(matched_path: Option<&str>) -> &'static str {
    match matched_path {
        Some("/execute") => "/execute",
        Some("/clawdbot/invoke") => "/clawdbot/invoke",
        Some("/edon/invoke") => "/edon/invoke",
        Some("/intent/set") => "/intent/set",
        Some("/intent/get") => "/intent/get",
        Some("/policy-packs") => "/policy-packs",
        Some("/policy-packs/{pack}/apply") => "/policy-packs/{pack}/apply",
        Some("/decisions/query") => "/decisions/query",
        Some("/audit/query") => "/audit/query",
        Some("/decisions/{id}") => "/decisions/{id}",
        Some("/timeseries") => "/timeseries",
        Some("/block-reasons") => "/block-reasons",
        Some("/credentials/set") => "/credentials/set",
        Some("/credentials") => "/credentials",
        Some("/credentials/{id}") => "/credentials/{id}",
        Some("/health") => "/health",
        Some("/metrics") => "/metrics",
        Some("/metrics/trust-spec") => "/metrics/trust-spec",
        Some("/integrations/clawdbot/connect") => "/integrations/clawdbot/connect",
        Some("/integrations/oauth/begin") => "/integrations/oauth/begin",
        Some("/integrations/oauth/callback") => "/integrations/oauth/callback",
        Some("/integrations/connect-code") => "/integrations/connect-code",
        Some("/integrations/channel-binding") => "/integrations/channel-binding",
        _ => "unmatched",
    }
}

/// Assigns a request id, records the request/status counter, and attaches
/// `X-Request-ID` to every response this gateway returns.
pub async fn request_id_and_metrics(State(ctx): State<Arc<AppContext>>, request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let matched_path = request.extensions().get::<MatchedPath>().map(MatchedPath::as_str).map(ToString::to_string);
    let route = route_label(matched_path.as_deref());

    let span = tracing::info_span!("request", request_id = %request_id, method = %method, route);
    let _guard = ctx.metrics.track_in_flight();

    let mut response = next.run(request).instrument(span).await;

    ctx.metrics.record_request(route, response.status().as_u16());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
