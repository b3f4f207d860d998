// crates/edon-server/src/main.rs
// ============================================================================
// Module: EDON Gateway Server Entry Point
// Description: Boots the gateway: loads and validates configuration,
// opens the store, builds the router, and serves HTTP until a shutdown
// signal arrives.
// Purpose: Keep the boot sequence fail-fast — a bad config or an
// unopenable store exits the process before a single connection is
// accepted.
// Dependencies: edon-config, edon-core, edon-store-sqlite, tokio, axum
// ============================================================================

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use edon_config::AppConfig;
use edon_core::logging;
use edon_core::logging::LogFormat;
use edon_server::router;
use edon_server::state::AppContext;

fn log_format() -> LogFormat {
    let raw = env::var("EDON_ENV").unwrap_or_default();
    LogFormat::from_env_value(&raw)
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(log_format());

    let config = match AppConfig::load(None) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let bind_addr = config.server.bind_addr;

    let ctx = match AppContext::build(config) {
        Ok(ctx) => Arc::new(ctx),
        Err(err) => {
            tracing::error!(error = %err, "failed to open store");
            return ExitCode::FAILURE;
        }
    };

    let app = router::build_router(ctx);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %bind_addr, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(addr = %bind_addr, "edon-server listening");

    let result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;
    if let Err(err) = result {
        tracing::error!(error = %err, "server exited with error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Resolves once a `SIGINT`/`SIGTERM`-equivalent shutdown is requested, so
/// `axum::serve` can drain in-flight requests before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
