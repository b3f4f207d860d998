// crates/edon-connectors/src/http_tool.rs
// ============================================================================
// Module: HTTP Tool Connector
// Description: Generic JSON-over-HTTPS connector reused across the
// external API tools (search, Gmail, Google Calendar, GitHub, ElevenLabs).
// Purpose: One hardened client configuration instead of five bespoke ones.
// Dependencies: edon-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpToolConnector`] posts `action.params` as a JSON body to a
//! configured base URL plus the action's `op` as a path segment, and
//! returns the parsed JSON response. The client disables redirects, caps
//! response size, and optionally restricts which hosts it will contact —
//! the same posture as the HTTP evidence client this lineage uses
//! elsewhere, adapted from a blocking client to an async one because the
//! gateway's request pipeline is async end to end.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use edon_core::Action;
use edon_core::Credential;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde_json::Value;
use url::Url;

use crate::registry::Connector;
use crate::registry::ConnectorError;
use crate::registry::ConnectorOutcome;

/// Configuration for a single external HTTP tool.
#[derive(Debug, Clone)]
pub struct HttpToolConfig {
    /// Base URL the connector posts against; `action.op` is appended as a
    /// path segment.
    pub base_url: Url,
    /// Request timeout.
    pub timeout_ms: u64,
    /// Maximum response body size accepted.
    pub max_response_bytes: usize,
    /// Hosts the connector is allowed to contact, if restricted.
    pub allowed_hosts: Option<BTreeSet<String>>,
    /// User agent string sent with every request.
    pub user_agent: String,
}

impl HttpToolConfig {
    /// Builds a config pointed at `base_url` with the gateway's defaults.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self { base_url, timeout_ms: 10_000, max_response_bytes: 2 * 1024 * 1024, allowed_hosts: None, user_agent: "edon-gateway/0.1".to_string() }
    }
}

/// Generic hardened HTTP-JSON connector for a single external tool.
pub struct HttpToolConnector {
    config: HttpToolConfig,
    client: Client,
}

impl HttpToolConnector {
    /// Builds a connector from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Sandbox`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: HttpToolConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| ConnectorError::Sandbox(format!("http client build failed: {err}")))?;
        Ok(Self { config, client })
    }

    fn validate_host(&self, url: &Url) -> Result<(), ConnectorError> {
        if url.scheme() != "https" {
            return Err(ConnectorError::InvalidParams("only https endpoints are allowed".to_string()));
        }
        if let Some(allowlist) = &self.config.allowed_hosts {
            let host = url.host_str().ok_or_else(|| ConnectorError::InvalidParams("url has no host".to_string()))?;
            if !allowlist.contains(host) {
                return Err(ConnectorError::InvalidParams(format!("host not allowed: {host}")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Connector for HttpToolConnector {
    async fn invoke(&self, action: &Action, credential: Option<&Credential>) -> ConnectorOutcome {
        let mut url = self.config.base_url.clone();
        {
            let Ok(mut segments) = url.path_segments_mut() else {
                return ConnectorOutcome::failure("base url cannot be a base for path segments");
            };
            segments.push(&action.op);
        }
        if let Err(err) = self.validate_host(&url) {
            return ConnectorOutcome::failure(err.to_string());
        }

        let mut request = self.client.post(url).json(&action.params);
        if let Some(credential) = credential
            && let Some(token) = credential.data.get("access_token").and_then(Value::as_str)
        {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => return ConnectorOutcome::downstream_unavailable(err.to_string()),
            Err(err) => return ConnectorOutcome::failure(err.to_string()),
        };

        if !response.status().is_success() {
            let status = response.status();
            return ConnectorOutcome::failure(format!("downstream returned status {status}"));
        }

        let max_bytes = u64::try_from(self.config.max_response_bytes).unwrap_or(u64::MAX);
        if let Some(len) = response.content_length()
            && len > max_bytes
        {
            return ConnectorOutcome::failure("response exceeds size limit".to_string());
        }
        match response.json::<Value>().await {
            Ok(body) => ConnectorOutcome::success(body),
            Err(err) => ConnectorOutcome::failure(format!("response was not valid json: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_plain_http_base_url_at_call_time() {
        let config = HttpToolConfig::new(Url::parse("http://example.com").unwrap());
        let connector = HttpToolConnector::new(config).unwrap();
        let url = Url::parse("http://example.com/search").unwrap();
        assert!(connector.validate_host(&url).is_err());
    }

    #[test]
    fn enforces_host_allowlist() {
        let mut config = HttpToolConfig::new(Url::parse("https://example.com").unwrap());
        config.allowed_hosts = Some(BTreeSet::from(["api.example.com".to_string()]));
        let connector = HttpToolConnector::new(config).unwrap();
        let blocked = Url::parse("https://evil.example.net/search").unwrap();
        assert!(connector.validate_host(&blocked).is_err());
        let allowed = Url::parse("https://api.example.com/search").unwrap();
        assert!(connector.validate_host(&allowed).is_ok());
    }
}
