// crates/edon-server/src/state.rs
// ============================================================================
// Module: Server State
// Description: The shared, per-process context every handler closes over,
// and the per-request connector registry built from it.
// Purpose: Give handlers one place to reach the store, evaluator settings,
// auth caches and metrics from, and keep connector construction scoped to
// a single request's resolved tenant rather than shared mutable state.
// Dependencies: edon-core, edon-config, edon-store-sqlite, edon-evaluator,
// edon-pipeline, edon-connectors
// ============================================================================

//! ## Overview
//! [`AppContext`] is built once at boot from [`edon_config::AppConfig`] and
//! wrapped in an `Arc` by `main`. It owns the SQLite store handle, the
//! in-process sliding-window action history the evaluator consults for
//! loop/rate detection, the JWKS cache, the MAG client, a clock, and the
//! metrics registry. It does not own a [`edon_connectors::ConnectorRegistry`]:
//! that is built fresh per request by [`AppContext::connectors_for_tenant`],
//! scoped to the tenant the pipeline's authentication stage already
//! resolved, so a credential rotation takes effect on the very next call
//! rather than waiting for a shared registry to be rebuilt.

use std::sync::Arc;

use edon_config::AppConfig;
use edon_connectors::ClawdbotConfig;
use edon_connectors::ClawdbotConnector;
use edon_connectors::Connector;
use edon_connectors::ConnectorRegistry;
use edon_connectors::EmailSandboxConnector;
use edon_connectors::FileSandboxConnector;
use edon_connectors::HttpToolConfig;
use edon_connectors::HttpToolConnector;
use edon_connectors::MemoryConnector;
use edon_core::SharedClock;
use edon_core::SystemClock;
use edon_core::TenantId;
use edon_core::Tool;
use edon_evaluator::ActionHistory;
use edon_pipeline::JwksCache;
use edon_pipeline::MagClient;
use edon_store_sqlite::SqliteStore;
use edon_store_sqlite::SqliteStoreConfig;
use edon_store_sqlite::SqliteStoreError;

use crate::metrics::Metrics;

/// Shared context every handler reads from.
pub struct AppContext {
    /// SQLite-backed persistence handle.
    pub store: SqliteStore,
    /// The validated configuration the gateway booted with.
    pub config: AppConfig,
    /// Sliding-window action history for loop and rate-of-action detection.
    pub history: ActionHistory,
    /// Cached JWKS document for session-JWT verification.
    pub jwks: JwksCache,
    /// Client for optional MAG pre-authorization lookups.
    pub mag: MagClient,
    /// Source of "now" for evaluation, rate limiting, and audit timestamps.
    pub clock: SharedClock,
    /// In-process request/decision/latency counters.
    pub metrics: Metrics,
}

impl AppContext {
    /// Builds the shared context from a validated configuration, opening
    /// the SQLite store and warming the JWKS/MAG clients.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the store fails to open.
    pub fn build(config: AppConfig) -> Result<Self, SqliteStoreError> {
        let store = SqliteStore::open(SqliteStoreConfig::new(config.store.sqlite_path.clone()))?;
        let history = ActionHistory::new();
        let jwks = JwksCache::new(config.auth.jwks_url.clone(), config.auth.jwks_cache_ttl_secs);
        let mag = MagClient::new(config.mag.clone());
        let clock: SharedClock = Arc::new(SystemClock);
        let metrics = Metrics::new();
        Ok(Self { store, config, history, jwks, mag, clock, metrics })
    }

    /// Builds a fresh connector registry scoped to `tenant_id`, wiring in
    /// only the tools this deployment has a configured backend for. A tool
    /// left unconfigured has no entry and any action against it fails
    /// closed with `ConnectorError::Unsupported` at dispatch time.
    #[must_use]
    pub fn connectors_for_tenant(&self, tenant_id: TenantId) -> ConnectorRegistry {
        let sandbox = &self.config.sandbox;
        let connectors = &self.config.connectors;
        let mut registry = ConnectorRegistry::new();

        registry.register(Tool::Email, Box::new(EmailSandboxConnector::new(sandbox.email_root.clone())));
        registry.register(Tool::File, Box::new(FileSandboxConnector::new(sandbox.file_root.clone())));
        // Calendar proposals are sandboxed the same way file drafts are: no
        // dedicated calendar connector exists, and the generic sandbox
        // connector's read/write-by-path semantics fit a proposal document
        // well enough to reuse rather than duplicate.
        registry.register(Tool::Calendar, Box::new(FileSandboxConnector::new(sandbox.calendar_root.clone())));
        registry.register(Tool::Memory, Box::new(MemoryConnector::new(sandbox.memory_root.clone(), tenant_id)));

        if let Some(clawdbot) = &connectors.clawdbot {
            match url::Url::parse(&clawdbot.invoke_url) {
                Ok(invoke_url) => {
                    let mut cfg = ClawdbotConfig::new(invoke_url);
                    cfg.timeout_ms = clawdbot.timeout_ms;
                    match ClawdbotConnector::new(cfg) {
                        Ok(connector) => registry.register(Tool::Clawdbot, Box::new(connector)),
                        Err(err) => tracing::error!(error = %err, "failed to build clawdbot connector"),
                    }
                }
                Err(err) => tracing::error!(error = %err, url = %clawdbot.invoke_url, "invalid clawdbot invoke_url, skipping connector"),
            }
        }

        for (tool, settings) in [
            (Tool::Gmail, &connectors.gmail),
            (Tool::GoogleCalendar, &connectors.google_calendar),
            (Tool::GitHub, &connectors.github),
            (Tool::BraveSearch, &connectors.brave_search),
            (Tool::ElevenLabs, &connectors.elevenlabs),
        ] {
            let Some(settings) = settings else { continue };
            let base_url = match url::Url::parse(&settings.base_url) {
                Ok(url) => url,
                Err(err) => {
                    tracing::error!(error = %err, tool = %tool, url = %settings.base_url, "invalid connector base_url, skipping connector");
                    continue;
                }
            };
            let mut cfg = HttpToolConfig::new(base_url);
            if let Some(hosts) = &settings.allowed_hosts {
                cfg.allowed_hosts = Some(hosts.iter().cloned().collect());
            }
            match HttpToolConnector::new(cfg) {
                Ok(connector) => registry.register(tool, Box::new(connector) as Box<dyn Connector>),
                Err(err) => tracing::error!(error = %err, tool = %tool, "failed to build http tool connector"),
            }
        }

        registry
    }
}
