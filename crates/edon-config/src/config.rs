// crates/edon-config/src/config.rs
// ============================================================================
// Module: Gateway Configuration
// Description: Configuration loading and validation for the EDON gateway.
// Purpose: Provide strict, fail-closed config parsing with hard limits,
// so a malformed or dangerous configuration refuses to boot rather than
// degrading silently.
// Dependencies: edon-core, serde, toml, thiserror
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits.
//! Missing or invalid configuration fails closed rather than falling back
//! to permissive defaults — a gateway that cannot confirm its own
//! configuration is not a gateway that should start accepting traffic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

const DEFAULT_CONFIG_NAME: &str = "edon-gateway.toml";
const CONFIG_ENV_VAR: &str = "EDON_CONFIG";
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Default recipient cap escalation threshold applied when a policy pack
/// leaves `max_recipients` unset. Not itself a validated field; presets
/// supply their own.
pub const DEFAULT_LOOP_WINDOW_SECS: u64 = 3600;

// ============================================================================
// SECTION: Top-level configuration
// ============================================================================

/// The gateway's full, validated configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence configuration.
    pub store: StoreConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate limit table configuration.
    #[serde(default)]
    pub rate_limit: RateLimitTables,
    /// Evaluator tuning parameters.
    #[serde(default)]
    pub evaluator: EvaluatorSettings,
    /// MAG external decision ledger configuration.
    #[serde(default)]
    pub mag: MagConfig,
    /// Sandbox connector root directories.
    pub sandbox: SandboxConfig,
    /// External connector and delegated-backend configuration.
    #[serde(default)]
    pub connectors: ConnectorsConfig,
    /// Boolean feature flags toggled by environment in deployment.
    #[serde(default)]
    pub flags: FeatureFlags,
    /// In-process metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// an explicit `path`, else `EDON_CONFIG`, else `edon-gateway.toml` in
    /// the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validating fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is contradictory or
    /// out of bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.rate_limit.validate()?;
        self.evaluator.validate()?;
        self.mag.validate()?;
        self.sandbox.validate()?;
        self.connectors.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Deployment posture; governs which auth fallbacks and dev affordances
/// are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// Full enforcement; no environment-token auth fallback unless
    /// explicitly re-enabled.
    Production,
    /// Local development; permits the environment-token auth fallback.
    Development,
}

impl Default for ServerMode {
    fn default() -> Self {
        Self::Development
    }
}

fn default_bind_addr() -> SocketAddr {
    ([0, 0, 0, 0], 8080).into()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Deployment posture.
    #[serde(default)]
    pub mode: ServerMode,
    /// Request paths reachable without authentication.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr(), mode: ServerMode::default(), public_paths: default_public_paths() }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.public_paths.iter().any(|path| !path.starts_with('/')) {
            return Err(ConfigError::Invalid("server.public_paths entries must start with '/'".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub sqlite_path: PathBuf,
}

// ============================================================================
// SECTION: Auth
// ============================================================================

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// URL to fetch the session-JWT issuer's JWKS document from.
    #[serde(default)]
    pub jwks_url: Option<String>,
    /// How long a cached JWKS document is trusted before refresh, in
    /// seconds.
    #[serde(default = "default_jwks_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
    /// Permits the environment-token auth fallback even when
    /// `server.mode == production`. Defaults to false; the fallback is
    /// otherwise only reachable outside production.
    #[serde(default)]
    pub allow_env_token_in_prod: bool,
}

fn default_jwks_ttl_secs() -> u64 {
    600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwks_url: None, jwks_cache_ttl_secs: default_jwks_ttl_secs(), allow_env_token_in_prod: false }
    }
}

// ============================================================================
// SECTION: Rate limits
// ============================================================================

/// One `(minute, hour, day)` limit table.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitTable {
    /// Max requests per minute.
    pub per_minute: u32,
    /// Max requests per hour.
    pub per_hour: u32,
    /// Max requests per day.
    pub per_day: u32,
}

impl RateLimitTable {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.per_minute == 0 || self.per_hour == 0 || self.per_day == 0 {
            return Err(ConfigError::Invalid(format!("{field} limits must be non-zero")));
        }
        if self.per_hour < self.per_minute || self.per_day < self.per_hour {
            return Err(ConfigError::Invalid(format!(
                "{field} limits must be non-decreasing across minute/hour/day"
            )));
        }
        Ok(())
    }
}

/// The three rate limit tables the pipeline selects between by caller
/// identity and endpoint class.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitTables {
    /// Table for authenticated, non-polling requests.
    #[serde(default = "default_rate_limit_default")]
    pub default: RateLimitTable,
    /// Stricter table applied when no `agent_id` is present.
    #[serde(default = "default_rate_limit_anonymous")]
    pub anonymous: RateLimitTable,
    /// Looser table applied to polling/analytics endpoints.
    #[serde(default = "default_rate_limit_polling")]
    pub polling: RateLimitTable,
}

impl Default for RateLimitTables {
    fn default() -> Self {
        Self {
            default: default_rate_limit_default(),
            anonymous: default_rate_limit_anonymous(),
            polling: default_rate_limit_polling(),
        }
    }
}

fn default_rate_limit_default() -> RateLimitTable {
    RateLimitTable { per_minute: 60, per_hour: 1_000, per_day: 10_000 }
}

fn default_rate_limit_anonymous() -> RateLimitTable {
    RateLimitTable { per_minute: 10, per_hour: 100, per_day: 500 }
}

fn default_rate_limit_polling() -> RateLimitTable {
    RateLimitTable { per_minute: 120, per_hour: 5_000, per_day: 50_000 }
}

impl RateLimitTables {
    fn validate(&self) -> Result<(), ConfigError> {
        self.default.validate("rate_limit.default")?;
        self.anonymous.validate("rate_limit.anonymous")?;
        self.polling.validate("rate_limit.polling")?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Evaluator
// ============================================================================

/// Tunable parameters for the policy evaluator, constructed here and
/// threaded into `edon-evaluator` rather than read from the environment
/// at evaluation time.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluatorSettings {
    /// Sliding window, in seconds, that loop detection and the sliding
    /// action history cover.
    #[serde(default = "default_loop_window_secs")]
    pub loop_window_secs: u64,
    /// Occurrences of the same `(tool, op, params_fingerprint)` within
    /// `loop_window_secs` that trigger `LOOP_DETECTED`.
    #[serde(default = "default_loop_threshold")]
    pub loop_threshold: u32,
    /// Actions within the last 60 seconds that trigger `RATE_LIMIT`.
    #[serde(default = "default_max_actions_per_minute")]
    pub max_actions_per_minute: u32,
    /// Inclusive start hour of the gateway-local work-hours window.
    #[serde(default = "default_work_hours_start")]
    pub work_hours_start: u8,
    /// Exclusive end hour of the gateway-local work-hours window.
    #[serde(default = "default_work_hours_end")]
    pub work_hours_end: u8,
    /// Case-insensitive substrings that promote shell risk to `critical`.
    #[serde(default = "default_dangerous_patterns")]
    pub dangerous_patterns: Vec<String>,
    /// Case-insensitive substrings that mark an op or its params as a
    /// sharing/export action.
    #[serde(default = "default_sharing_patterns")]
    pub sharing_patterns: Vec<String>,
    /// Tool name to expected objective keywords, used for the alignment
    /// check.
    #[serde(default)]
    pub objective_keywords: BTreeMap<String, Vec<String>>,
}

fn default_loop_window_secs() -> u64 {
    DEFAULT_LOOP_WINDOW_SECS
}

fn default_loop_threshold() -> u32 {
    5
}

fn default_max_actions_per_minute() -> u32 {
    30
}

fn default_work_hours_start() -> u8 {
    8
}

fn default_work_hours_end() -> u8 {
    20
}

fn default_dangerous_patterns() -> Vec<String> {
    vec![
        "rm -rf".to_string(),
        ":(){ :|:& };:".to_string(),
        "mkfs".to_string(),
        "dd if=".to_string(),
        "chmod -r 777".to_string(),
        "> /dev/sda".to_string(),
        "curl | sh".to_string(),
        "wget | sh".to_string(),
    ]
}

fn default_sharing_patterns() -> Vec<String> {
    vec!["export".to_string(), "forward".to_string(), "share".to_string(), "publish".to_string()]
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            loop_window_secs: default_loop_window_secs(),
            loop_threshold: default_loop_threshold(),
            max_actions_per_minute: default_max_actions_per_minute(),
            work_hours_start: default_work_hours_start(),
            work_hours_end: default_work_hours_end(),
            dangerous_patterns: default_dangerous_patterns(),
            sharing_patterns: default_sharing_patterns(),
            objective_keywords: BTreeMap::new(),
        }
    }
}

impl EvaluatorSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.work_hours_start > 23 || self.work_hours_end > 23 {
            return Err(ConfigError::Invalid("evaluator.work_hours_* must be in 0..=23".to_string()));
        }
        if self.loop_threshold == 0 {
            return Err(ConfigError::Invalid("evaluator.loop_threshold must be non-zero".to_string()));
        }
        if self.max_actions_per_minute == 0 {
            return Err(ConfigError::Invalid("evaluator.max_actions_per_minute must be non-zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: MAG
// ============================================================================

/// External decision-ledger verification, required only for tenants that
/// opt in.
#[derive(Debug, Clone, Deserialize)]
pub struct MagConfig {
    /// Whether MAG pre-authorization is checked at all.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the external decision ledger service.
    #[serde(default)]
    pub ledger_url: Option<String>,
    /// Request timeout, in milliseconds, for ledger lookups.
    #[serde(default = "default_mag_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_mag_timeout_ms() -> u64 {
    2_000
}

impl Default for MagConfig {
    fn default() -> Self {
        Self { enabled: false, ledger_url: None, timeout_ms: default_mag_timeout_ms() }
    }
}

impl MagConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.ledger_url.is_none() {
            return Err(ConfigError::Invalid("mag.ledger_url is required when mag.enabled is true".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Sandbox
// ============================================================================

/// Root directories the sandboxed connectors are confined to.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxConfig {
    /// Root directory for the email sandbox connector's written drafts.
    pub email_root: PathBuf,
    /// Root directory for the filesystem sandbox connector.
    pub file_root: PathBuf,
    /// Root directory for the calendar sandbox connector's written
    /// proposals.
    pub calendar_root: PathBuf,
    /// Root directory for per-tenant persistent memory documents.
    pub memory_root: PathBuf,
}

impl SandboxConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("sandbox.email_root", &self.email_root.to_string_lossy())?;
        validate_path_string("sandbox.file_root", &self.file_root.to_string_lossy())?;
        validate_path_string("sandbox.calendar_root", &self.calendar_root.to_string_lossy())?;
        validate_path_string("sandbox.memory_root", &self.memory_root.to_string_lossy())?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Connectors
// ============================================================================

/// Configuration for the delegated super-tool backend ("Clawdbot").
#[derive(Debug, Clone, Deserialize)]
pub struct ClawdbotSettings {
    /// URL the connector posts invocations to.
    pub invoke_url: String,
    /// Request timeout, in milliseconds.
    #[serde(default = "default_clawdbot_timeout_ms")]
    pub timeout_ms: u64,
    /// Default credential id used when a request does not supply one,
    /// optionally suffixed with the tenant id by the caller.
    #[serde(default = "default_clawdbot_credential_id")]
    pub default_credential_id: String,
}

fn default_clawdbot_timeout_ms() -> u64 {
    15_000
}

fn default_clawdbot_credential_id() -> String {
    "clawdbot-default".to_string()
}

/// Base URL and allowed hosts for one generic HTTP-JSON external tool.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpToolSettings {
    /// Base URL the connector posts against.
    pub base_url: String,
    /// Hosts the connector may contact, if restricted beyond `base_url`'s
    /// own host.
    #[serde(default)]
    pub allowed_hosts: Option<Vec<String>>,
}

/// External connector configuration: the delegated backend plus whichever
/// HTTP-JSON tools this deployment has wired up. A tool absent here has no
/// registered connector and any action against it fails closed with
/// `ConnectorError::Unsupported`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorsConfig {
    /// Delegated super-tool backend, if configured.
    #[serde(default)]
    pub clawdbot: Option<ClawdbotSettings>,
    /// Gmail connector endpoint, if configured.
    #[serde(default)]
    pub gmail: Option<HttpToolSettings>,
    /// Google Calendar connector endpoint, if configured.
    #[serde(default)]
    pub google_calendar: Option<HttpToolSettings>,
    /// Code host connector endpoint, if configured.
    #[serde(default)]
    pub github: Option<HttpToolSettings>,
    /// Web search connector endpoint, if configured.
    #[serde(default)]
    pub brave_search: Option<HttpToolSettings>,
    /// Text-to-speech connector endpoint, if configured.
    #[serde(default)]
    pub elevenlabs: Option<HttpToolSettings>,
}

impl ConnectorsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(clawdbot) = &self.clawdbot {
            url::Url::parse(&clawdbot.invoke_url)
                .map_err(|err| ConfigError::Invalid(format!("connectors.clawdbot.invoke_url is invalid: {err}")))?;
        }
        for (field, tool) in [
            ("connectors.gmail", &self.gmail),
            ("connectors.google_calendar", &self.google_calendar),
            ("connectors.github", &self.github),
            ("connectors.brave_search", &self.brave_search),
            ("connectors.elevenlabs", &self.elevenlabs),
        ] {
            if let Some(tool) = tool {
                url::Url::parse(&tool.base_url)
                    .map_err(|err| ConfigError::Invalid(format!("{field}.base_url is invalid: {err}")))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Feature flags
// ============================================================================

/// Boolean posture switches, named after spec.md's documented environment
/// variables rather than read from the environment directly at request
/// time.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeatureFlags {
    /// Reject a governed request when its resolved credential is missing,
    /// rather than letting the connector report the absence at call time.
    #[serde(default = "default_true")]
    pub credentials_strict: bool,
    /// Apply the dangerous-pattern string scan during request validation.
    #[serde(default = "default_true")]
    pub strict_validation: bool,
    /// Enforce per-subject rate limit windows at all.
    #[serde(default = "default_true")]
    pub rate_limit_enabled: bool,
    /// Relaxes a handful of write-path checks for scripted demos. Never
    /// true in a production deployment.
    #[serde(default)]
    pub demo_mode: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { credentials_strict: true, strict_validation: true, rate_limit_enabled: true, demo_mode: false }
    }
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// In-process counters/histograms exposition toggle.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MetricsConfig {
    /// Whether `GET /metrics` and `GET /metrics/trust-spec` render their
    /// bodies at all; both return `503` when false.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Environment name; `"production"` selects JSON output.
    #[serde(default = "default_logging_env")]
    pub env: String,
}

fn default_logging_env() -> String {
    "development".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { env: default_logging_env() }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    Ok(())
}

fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_minimal_config(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("edon-gateway.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
            [store]
            sqlite_path = "gateway.db"

            [sandbox]
            email_root = "sandbox/email"
            file_root = "sandbox/files"
            calendar_root = "sandbox/calendar"
            memory_root = "sandbox/memory"
            "#
        )
        .unwrap();
        path
    }

    #[test]
    fn minimal_config_loads_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_minimal_config(&dir);
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.mode, ServerMode::Development);
        assert_eq!(config.rate_limit.default.per_minute, 60);
        assert_eq!(config.evaluator.loop_threshold, 5);
    }

    #[test]
    fn mag_enabled_without_url_is_rejected() {
        let mag = MagConfig { enabled: true, ledger_url: None, timeout_ms: 1_000 };
        assert!(mag.validate().is_err());
    }

    #[test]
    fn rate_limit_table_must_be_non_decreasing() {
        let table = RateLimitTable { per_minute: 100, per_hour: 50, per_day: 1_000 };
        assert!(table.validate("rate_limit.default").is_err());
    }

    #[test]
    fn work_hours_out_of_range_is_rejected() {
        let mut settings = EvaluatorSettings::default();
        settings.work_hours_start = 30;
        assert!(settings.validate().is_err());
    }
}
