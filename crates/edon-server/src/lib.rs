// crates/edon-server/src/lib.rs
// ============================================================================
// Module: EDON Gateway Server Library Surface
// Description: Re-exports the modules `main.rs` wires into a running
// process, so integration tests can build an `AppContext`, a router, and
// drive real HTTP requests without spawning a subprocess.
// Purpose: Give `tests/*.rs` something to `use edon_server::...` from.
// Dependencies: edon-config, edon-core, edon-store-sqlite, axum, tokio
// ============================================================================

pub mod credentials;
pub mod error;
pub mod handlers;
pub mod intents;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod router;
pub mod state;
