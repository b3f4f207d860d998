// crates/edon-connectors/src/registry.rs
// ============================================================================
// Module: Connector Registry
// Description: Routes an allowed action to the connector for its tool.
// Purpose: Give the pipeline one dispatch point instead of a per-tool
// match scattered across handlers.
// Dependencies: edon-core, async-trait
// ============================================================================

//! ## Overview
//! [`ConnectorRegistry`] is built once at boot from configuration and holds
//! one [`Connector`] per [`Tool`] it knows how to serve. `dispatch` is the
//! only entry point the pipeline calls: it looks up the connector for
//! `action.tool` and forwards the call, turning "tool not wired up" into a
//! typed [`ConnectorError::Unsupported`] rather than a panic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use edon_core::Action;
use edon_core::Credential;
use edon_core::Tool;
use serde_json::Value;
use thiserror::Error;

/// Outcome of a single connector invocation.
///
/// # Invariants
/// - `success == true` implies `error.is_none()`.
/// - `downstream_unavailable == true` implies `success == false`.
#[derive(Debug, Clone)]
pub struct ConnectorOutcome {
    /// Whether the call succeeded.
    pub success: bool,
    /// The connector's result payload, present only on success.
    pub result: Option<Value>,
    /// A short, user-safe error message, present only on failure.
    pub error: Option<String>,
    /// Whether failure was caused by the downstream being unreachable
    /// (connection refused, timeout) rather than a protocol-level error.
    pub downstream_unavailable: bool,
}

impl ConnectorOutcome {
    /// Builds a successful outcome.
    #[must_use]
    pub const fn success(result: Value) -> Self {
        Self { success: true, result: Some(result), error: None, downstream_unavailable: false }
    }

    /// Builds a failed outcome from a protocol or validation error.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, result: None, error: Some(error.into()), downstream_unavailable: false }
    }

    /// Builds a failed outcome caused by the downstream being unreachable.
    #[must_use]
    pub fn downstream_unavailable(error: impl Into<String>) -> Self {
        Self { success: false, result: None, error: Some(error.into()), downstream_unavailable: true }
    }
}

/// Errors a connector raises before it can even attempt the call.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The action's tool has no registered connector.
    #[error("no connector registered for tool: {0}")]
    Unsupported(Tool),
    /// The action requires a credential and none was supplied.
    #[error("connector requires a credential: {0}")]
    CredentialRequired(Tool),
    /// Sandbox path validation failed.
    #[error("sandbox error: {0}")]
    Sandbox(String),
    /// The action's params did not match what this connector expects.
    #[error("invalid action params: {0}")]
    InvalidParams(String),
}

/// Uniform per-tool side-effect executor.
///
/// Implementations must not cache credentials across calls; each instance
/// is built fresh per request from the credential the pipeline resolved.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Performs the action's real side effect and reports the outcome.
    async fn invoke(&self, action: &Action, credential: Option<&Credential>) -> ConnectorOutcome;
}

/// Routes an action to the connector registered for its tool.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: BTreeMap<Tool, Box<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { connectors: BTreeMap::new() }
    }

    /// Registers `connector` as the executor for `tool`, replacing any
    /// previous registration.
    pub fn register(&mut self, tool: Tool, connector: Box<dyn Connector>) {
        self.connectors.insert(tool, connector);
    }

    /// Dispatches `action` to the connector registered for `action.tool`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Unsupported`] if no connector is
    /// registered for `action.tool`.
    pub async fn dispatch(&self, action: &Action, credential: Option<&Credential>) -> Result<ConnectorOutcome, ConnectorError> {
        let connector = self.connectors.get(&action.tool).ok_or(ConnectorError::Unsupported(action.tool))?;
        Ok(connector.invoke(action, credential).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edon_core::ActionSource;
    use edon_core::RiskLevel;
    use edon_core::Timestamp;
    use serde_json::json;

    struct EchoConnector;

    #[async_trait]
    impl Connector for EchoConnector {
        async fn invoke(&self, action: &Action, _credential: Option<&Credential>) -> ConnectorOutcome {
            ConnectorOutcome::success(json!({"op": action.op}))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_tool() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Tool::Memory, Box::new(EchoConnector));
        let action = Action::new(Tool::Memory, "write", json!({}), Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(), ActionSource::Agent, RiskLevel::Low);
        let outcome = registry.dispatch(&action, None).await.unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn dispatch_reports_unsupported_tool() {
        let registry = ConnectorRegistry::new();
        let action = Action::new(Tool::GitHub, "create_issue", json!({}), Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(), ActionSource::Agent, RiskLevel::Low);
        let result = registry.dispatch(&action, None).await;
        assert!(matches!(result, Err(ConnectorError::Unsupported(Tool::GitHub))));
    }
}
