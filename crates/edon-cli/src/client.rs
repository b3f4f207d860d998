// crates/edon-cli/src/client.rs
// ============================================================================
// Module: Gateway Client
// Description: A thin `reqwest`-based HTTP client for the gateway's REST
// surface, used by every subcommand in `main.rs`.
// Purpose: Keep header wiring (credential, agent id) and error-body
// parsing in one place instead of repeating it per subcommand.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! Every method sends the same credential headers configured on
//! [`GatewayClient::new`] and returns the response body as a raw
//! [`serde_json::Value`] rather than a typed struct: this client talks to
//! the gateway purely over HTTP, the same as any other agent SDK, so it
//! has no reason to depend on the gateway's own response DTOs and works
//! with the wire JSON directly, the same shape an operator would see
//! curling the endpoint by hand.

use reqwest::Client;
use reqwest::Method;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

/// Configuration and transport for talking to one gateway deployment.
pub struct GatewayClient {
    base_url: String,
    http: Client,
    edon_token: Option<String>,
    bearer_token: Option<String>,
    agent_id: Option<String>,
}

impl GatewayClient {
    /// Builds a client pointed at `base_url`, authenticating with
    /// `edon_token` (sent as `X-Edon-Token`) if present, else
    /// `bearer_token` (sent as `Authorization: Bearer`).
    #[must_use]
    pub fn new(base_url: String, edon_token: Option<String>, bearer_token: Option<String>, agent_id: Option<String>) -> Self {
        Self { base_url, http: Client::new(), edon_token, bearer_token, agent_id }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = &self.edon_token {
            builder = builder.header("x-edon-token", token);
        } else if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(agent_id) = &self.agent_id {
            builder = builder.header("x-agent-id", agent_id);
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value, CliError> {
        let response = builder.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(body)
        } else {
            Err(CliError::Gateway { status: status.as_u16(), detail: gateway_detail(status, &body) })
        }
    }

    /// `GET path` with no query parameters.
    pub async fn get(&self, path: &str) -> Result<Value, CliError> {
        self.send(self.request(Method::GET, path)).await
    }

    /// `GET path` with `query` appended as `?key=value` pairs, skipping
    /// entries whose value is `None`.
    pub async fn get_with_query(&self, path: &str, query: &[(&str, Option<&str>)]) -> Result<Value, CliError> {
        let pairs: Vec<(&str, &str)> = query.iter().filter_map(|(key, value)| value.map(|v| (*key, v))).collect();
        self.send(self.request(Method::GET, path).query(&pairs)).await
    }

    /// `POST path` with `body` serialized as the JSON request body.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Value, CliError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// `POST path` with `body` and an `X-Intent-Id` header, for endpoints
    /// (like `/clawdbot/invoke`) where the request body is forwarded
    /// verbatim to a downstream tool and can't carry an envelope field.
    pub async fn post_with_intent<T: Serialize + ?Sized>(&self, path: &str, body: &T, intent_id: Option<&str>) -> Result<Value, CliError> {
        let mut builder = self.request(Method::POST, path).json(body);
        if let Some(intent_id) = intent_id {
            builder = builder.header("x-intent-id", intent_id);
        }
        self.send(builder).await
    }

    /// `DELETE path` with no request body.
    pub async fn delete(&self, path: &str) -> Result<Value, CliError> {
        self.send(self.request(Method::DELETE, path)).await
    }
}

fn gateway_detail(status: StatusCode, body: &Value) -> String {
    body.get("detail")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string())
}
