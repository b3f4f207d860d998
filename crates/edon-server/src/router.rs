// crates/edon-server/src/router.rs
// ============================================================================
// Module: Router
// Description: Wires every route onto its handler and layers the
// request-id/metrics middleware over the whole tree.
// Purpose: Keep the route table a flat, auditable list rather than
// scattering `Router::route` calls across modules.
// Dependencies: axum
// ============================================================================

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use tower_http::trace::TraceLayer;

use crate::handlers::audit;
use crate::handlers::clawdbot;
use crate::handlers::credentials;
use crate::handlers::execute;
use crate::handlers::health;
use crate::handlers::integrations;
use crate::handlers::intent;
use crate::handlers::metrics;
use crate::handlers::policy_packs;
use crate::middleware::request_id_and_metrics;
use crate::state::AppContext;

/// Builds the gateway's full route table over `ctx`.
#[must_use]
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/execute", post(execute::execute))
        .route("/clawdbot/invoke", post(clawdbot::invoke))
        .route("/edon/invoke", post(clawdbot::invoke))
        .route("/intent/set", post(intent::set_intent))
        .route("/intent/get", get(intent::get_intent))
        .route("/policy-packs", get(policy_packs::list_policy_packs))
        .route("/policy-packs/{pack}/apply", post(policy_packs::apply_policy_pack))
        .route("/decisions/query", get(audit::query))
        .route("/audit/query", get(audit::query))
        .route("/decisions/{id}", get(audit::get))
        .route("/timeseries", get(audit::timeseries))
        .route("/block-reasons", get(audit::block_reasons))
        .route("/credentials/set", post(credentials::set))
        .route("/credentials", get(credentials::list))
        .route("/credentials/{id}", delete(credentials::delete))
        .route("/metrics", get(metrics::metrics))
        .route("/metrics/trust-spec", get(metrics::trust_spec))
        .route("/integrations/clawdbot/connect", post(integrations::clawdbot_connect))
        .route("/integrations/channel-binding", post(integrations::channel_binding))
        .route("/integrations/connect-code", post(integrations::connect_code))
        .route("/integrations/oauth/begin", get(integrations::oauth_begin))
        .route("/integrations/oauth/callback", get(integrations::oauth_callback))
        .layer(middleware::from_fn_with_state(ctx.clone(), request_id_and_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
