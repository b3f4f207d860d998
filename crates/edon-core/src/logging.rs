// crates/edon-core/src/logging.rs
// ============================================================================
// Module: Structured Logging
// Description: Process-wide tracing initialization shared by the server
// and CLI binaries.
// Purpose: Give every EDON binary one place to decide log format
// (pretty for a terminal, JSON for a deployed environment) and one
// env-var the operator can use to tune verbosity.
// Dependencies: tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `init` reads `EDON_LOG` (falling back to `info`) through
//! `tracing_subscriber::EnvFilter` and installs either a JSON or a
//! pretty-printed formatter depending on [`LogFormat`]. Binaries call
//! this exactly once, at the top of `main`, before constructing anything
//! that logs.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Output shape for the process's log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, for local development.
    Pretty,
    /// One JSON object per line, for ingestion by a log pipeline.
    Json,
}

impl LogFormat {
    /// Chooses a format from an environment value such as `EDON_ENV`.
    ///
    /// Anything other than `"production"` (case-insensitive) is treated
    /// as a development environment and gets [`LogFormat::Pretty`].
    #[must_use]
    pub fn from_env_value(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("production") { Self::Json } else { Self::Pretty }
    }
}

const DEFAULT_FILTER: &str = "info";

/// Installs the process-wide tracing subscriber.
///
/// Safe to call once per process; a second call is a logic error in the
/// caller and is reported rather than panicking, since binaries may share
/// startup code paths with tests.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_env("EDON_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match format {
        LogFormat::Json => fmt().with_env_filter(filter).json().with_target(true).try_init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).with_target(false).compact().try_init(),
    };

    if let Err(error) = result {
        eprintln!("tracing subscriber already initialized: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_selects_json() {
        assert_eq!(LogFormat::from_env_value("production"), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value("PRODUCTION"), LogFormat::Json);
    }

    #[test]
    fn anything_else_selects_pretty() {
        assert_eq!(LogFormat::from_env_value("development"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_env_value(""), LogFormat::Pretty);
    }
}
