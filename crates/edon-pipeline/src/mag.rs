// crates/edon-pipeline/src/mag.rs
// ============================================================================
// Module: MAG Validation
// Description: Optional pre-authorization check against an external
// decision ledger (the "Mutual Agent Governance" bundle).
// Purpose: Let a tenant opt into requiring a signed-off decision bundle
// before the gateway will even run its own evaluator.
// Dependencies: edon-config, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! MAG semantics are only partially specified upstream; this is treated as
//! an optional pre-authorization gate, not a replacement for the
//! evaluator. When `edon_config::MagConfig::enabled` is false the check is
//! skipped entirely. When enabled, the caller must supply either an
//! `X-Decision-ID` header or an inline `decision_bundle`; the referenced
//! bundle is fetched from the configured ledger and its `verdict` field
//! must equal `"allow"`.

use edon_config::MagConfig;
use serde::Deserialize;
use serde_json::Value;

use crate::error::PipelineError;

#[derive(Debug, Deserialize)]
struct LedgerBundle {
    verdict: String,
}

/// Client for the external decision ledger MAG validation consults.
pub struct MagClient {
    client: reqwest::Client,
    config: MagConfig,
}

impl MagClient {
    /// Builds a client bound to `config`. Does nothing network-facing
    /// until [`MagClient::validate`] is called on an enabled config.
    #[must_use]
    pub fn new(config: MagConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }

    /// Runs the MAG pre-authorization check. A no-op when MAG is disabled
    /// for this gateway.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidRequest`] when MAG is enabled and
    /// neither a decision id nor an inline bundle was supplied,
    /// [`PipelineError::MagRejected`] when the ledger rejects or cannot be
    /// reached, and [`PipelineError::Internal`] on a malformed ledger
    /// response.
    pub async fn validate(
        &self,
        decision_id: Option<&str>,
        inline_bundle: Option<&Value>,
    ) -> Result<(), PipelineError> {
        if !self.config.enabled {
            return Ok(());
        }

        let bundle = match (decision_id, inline_bundle) {
            (_, Some(bundle)) => bundle.clone(),
            (Some(id), None) => self.fetch_bundle(id).await?,
            (None, None) => {
                return Err(PipelineError::InvalidRequest(
                    "mag validation is enabled but no X-Decision-ID or decision_bundle was supplied".to_string(),
                ));
            }
        };

        let parsed: LedgerBundle =
            serde_json::from_value(bundle).map_err(|err| PipelineError::Internal(err.to_string()))?;
        if parsed.verdict != "allow" {
            return Err(PipelineError::MagRejected(format!("ledger verdict was {:?}, not allow", parsed.verdict)));
        }
        Ok(())
    }

    async fn fetch_bundle(&self, decision_id: &str) -> Result<Value, PipelineError> {
        let base = self
            .config
            .ledger_url
            .as_ref()
            .ok_or_else(|| PipelineError::Internal("mag.enabled is true with no ledger_url configured".to_string()))?;
        let url = format!("{}/decisions/{decision_id}", base.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_millis(self.config.timeout_ms))
            .send()
            .await
            .map_err(|err| PipelineError::MagRejected(format!("ledger unreachable: {err}")))?;
        if !response.status().is_success() {
            return Err(PipelineError::MagRejected(format!("ledger returned status {}", response.status())));
        }
        response.json().await.map_err(|err| PipelineError::Internal(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> MagConfig {
        MagConfig { enabled: false, ledger_url: None, timeout_ms: 1_000 }
    }

    #[tokio::test]
    async fn disabled_mag_always_passes() {
        let client = MagClient::new(disabled_config());
        client.validate(None, None).await.unwrap();
    }

    #[tokio::test]
    async fn enabled_mag_without_any_reference_is_invalid_request() {
        let mut config = disabled_config();
        config.enabled = true;
        config.ledger_url = Some("http://localhost:1".to_string());
        let client = MagClient::new(config);
        let err = client.validate(None, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn inline_bundle_with_allow_verdict_passes() {
        let mut config = disabled_config();
        config.enabled = true;
        config.ledger_url = Some("http://localhost:1".to_string());
        let client = MagClient::new(config);
        let bundle = serde_json::json!({"verdict": "allow"});
        client.validate(None, Some(&bundle)).await.unwrap();
    }

    #[tokio::test]
    async fn inline_bundle_with_deny_verdict_is_rejected() {
        let mut config = disabled_config();
        config.enabled = true;
        config.ledger_url = Some("http://localhost:1".to_string());
        let client = MagClient::new(config);
        let bundle = serde_json::json!({"verdict": "deny"});
        let err = client.validate(None, Some(&bundle)).await.unwrap_err();
        assert!(matches!(err, PipelineError::MagRejected(_)));
    }
}
