// crates/edon-config/src/lib.rs
// ============================================================================
// Module: EDON Configuration
// Description: Typed, fail-closed configuration for every EDON binary.
// Purpose: Anchor crate for loading, validating, and documenting the
// gateway's TOML configuration file.
// ============================================================================

//! ## Overview
//! Configuration loads from a TOML file resolved from an explicit path, the
//! `EDON_CONFIG` environment variable, or `edon-gateway.toml` in the
//! current directory, in that order. Loading is strict: an oversized file,
//! invalid UTF-8, malformed TOML, or a validation failure all fail closed
//! rather than falling back to defaults silently. `edon-server` and
//! `edon-cli` both depend on this crate instead of parsing TOML themselves.

pub mod config;
pub mod docs;

pub use config::AppConfig;
pub use config::AuthConfig;
pub use config::ClawdbotSettings;
pub use config::ConfigError;
pub use config::ConnectorsConfig;
pub use config::EvaluatorSettings;
pub use config::FeatureFlags;
pub use config::HttpToolSettings;
pub use config::LoggingConfig;
pub use config::MagConfig;
pub use config::MetricsConfig;
pub use config::RateLimitTable;
pub use config::RateLimitTables;
pub use config::SandboxConfig;
pub use config::ServerConfig;
pub use config::ServerMode;
pub use config::StoreConfig;
