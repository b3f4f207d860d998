// crates/edon-cli/src/error.rs
// ============================================================================
// Module: CLI Errors
// Description: The error type every subcommand returns, covering transport
// failures, non-2xx gateway responses, and local JSON/IO mistakes.
// Purpose: Give `main` one type to match on when turning a failure into an
// exit code and a stderr line.
// Dependencies: reqwest, serde_json, thiserror
// ============================================================================

use thiserror::Error;

/// Errors the CLI can surface to the operator.
#[derive(Debug, Error)]
pub enum CliError {
    /// The HTTP request itself failed (DNS, connect, TLS, timeout).
    #[error("request to gateway failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx status.
    #[error("gateway returned {status}: {detail}")]
    Gateway {
        /// HTTP status code the gateway responded with.
        status: u16,
        /// The `detail` field from the gateway's error body, or a fallback
        /// when the body wasn't the expected `{detail}` shape.
        detail: String,
    },

    /// A `--params`/`--data`/`--scope` argument wasn't valid JSON.
    #[error("invalid JSON in {arg}: {source}")]
    InvalidJson {
        /// Which CLI argument the bad JSON came from.
        arg: &'static str,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A `--*-file` argument couldn't be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path the CLI tried to read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing output to stdout failed.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}
