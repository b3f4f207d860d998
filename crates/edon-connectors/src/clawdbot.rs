// crates/edon-connectors/src/clawdbot.rs
// ============================================================================
// Module: Clawdbot Connector
// Description: Proxy to the delegated super-tool backend.
// Purpose: Forward an ALLOWed `clawdbot` action (and its own internal
// `tool` sub-field) to the downstream agent-automation backend.
// Dependencies: edon-core, reqwest
// ============================================================================

//! ## Overview
//! Clawdbot actions have already passed the evaluator's sub-tool
//! allowlist check (`action.params["tool"]` against
//! `intent.constraints.allowed_clawdbot_tools`) by the time they reach
//! this connector. [`ClawdbotConnector`] does not re-check that allowlist;
//! it forwards the whole `params` object as the request body and treats
//! the downstream's response as opaque JSON.

use std::time::Duration;

use async_trait::async_trait;
use edon_core::Action;
use edon_core::Credential;
use reqwest::Client;
use reqwest::redirect::Policy;
use url::Url;

use crate::registry::Connector;
use crate::registry::ConnectorError;
use crate::registry::ConnectorOutcome;

/// Configuration for reaching the delegated super-tool backend.
#[derive(Debug, Clone)]
pub struct ClawdbotConfig {
    /// Base invoke endpoint of the Clawdbot backend.
    pub invoke_url: Url,
    /// Request timeout.
    pub timeout_ms: u64,
}

impl ClawdbotConfig {
    /// Builds a config pointed at `invoke_url` with the gateway's default
    /// timeout.
    #[must_use]
    pub fn new(invoke_url: Url) -> Self {
        Self { invoke_url, timeout_ms: 15_000 }
    }
}

/// Proxies governed actions to the Clawdbot backend.
pub struct ClawdbotConnector {
    config: ClawdbotConfig,
    client: Client,
}

impl ClawdbotConnector {
    /// Builds a connector from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Sandbox`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: ClawdbotConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(Policy::none())
            .build()
            .map_err(|err| ConnectorError::Sandbox(format!("http client build failed: {err}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Connector for ClawdbotConnector {
    async fn invoke(&self, action: &Action, credential: Option<&Credential>) -> ConnectorOutcome {
        let Some(credential) = credential else {
            return ConnectorOutcome::failure("clawdbot invocation requires a credential");
        };
        let Some(token) = credential.data.get("bearer_token").and_then(serde_json::Value::as_str) else {
            return ConnectorOutcome::failure("clawdbot credential missing bearer_token");
        };

        let response = self.client.post(self.config.invoke_url.clone()).bearer_auth(token).json(&action.params).send().await;
        let response = match response {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => return ConnectorOutcome::downstream_unavailable(err.to_string()),
            Err(err) => return ConnectorOutcome::failure(err.to_string()),
        };

        if !response.status().is_success() {
            let status = response.status();
            return ConnectorOutcome::failure(format!("clawdbot backend returned status {status}"));
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => ConnectorOutcome::success(body),
            Err(err) => ConnectorOutcome::failure(format!("clawdbot response was not valid json: {err}")),
        }
    }
}
