// crates/edon-connectors/src/memory.rs
// ============================================================================
// Module: Memory Connector
// Description: Sandboxed persistent agent memory, one JSON document per
// tenant.
// Purpose: Give agents a durable scratchpad without coupling it to the
// decision store.
// Dependencies: edon-core, cap-std
// ============================================================================

//! ## Overview
//! [`MemoryConnector`] is built fresh per request, rooted at a single
//! tenant's memory file (`<memory_root>/<tenant_id>.json`), the same
//! per-request-construction discipline the other connectors in this crate
//! follow. It supports two operations: `read`, returning the whole stored
//! document, and `write`, replacing it wholesale with `action.params["value"]`.
//! There is no partial-merge write; callers that want to append read first.

use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;
use edon_core::Action;
use edon_core::Credential;
use edon_core::TenantId;
use serde_json::Value;
use serde_json::json;

use crate::registry::Connector;
use crate::registry::ConnectorError;
use crate::registry::ConnectorOutcome;

/// Sandboxed per-tenant persistent memory connector.
pub struct MemoryConnector {
    root: PathBuf,
    file_name: String,
}

impl MemoryConnector {
    /// Builds a connector scoped to `tenant_id`'s memory file under
    /// `memory_root`, which must already exist.
    #[must_use]
    pub fn new(memory_root: PathBuf, tenant_id: TenantId) -> Self {
        Self { root: memory_root, file_name: format!("{tenant_id}.json") }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn invoke(&self, action: &Action, _credential: Option<&Credential>) -> ConnectorOutcome {
        let root = self.root.clone();
        let file_name = self.file_name.clone();
        let action = action.clone();
        tokio::task::spawn_blocking(move || run_memory_op(&root, &file_name, &action)).await.map_or_else(
            |err| ConnectorOutcome::failure(format!("memory task panicked: {err}")),
            |result| result.map_or_else(|err| ConnectorOutcome::failure(err.to_string()), ConnectorOutcome::success),
        )
    }
}

fn run_memory_op(root: &Path, file_name: &str, action: &Action) -> Result<Value, ConnectorError> {
    let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|err| ConnectorError::Sandbox(format!("cannot open memory root: {err}")))?;
    match action.op.as_str() {
        "read" => Ok(json!({"value": read_memory(&dir, file_name)?})),
        "write" => {
            let value = action.params.get("value").cloned().ok_or_else(|| ConnectorError::InvalidParams("missing value param".to_string()))?;
            write_memory(&dir, file_name, &value)?;
            Ok(json!({"written": true}))
        }
        other => Err(ConnectorError::InvalidParams(format!("unsupported memory op: {other}"))),
    }
}

fn read_memory(dir: &Dir, file_name: &str) -> Result<Value, ConnectorError> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    match dir.open_with(file_name, &options) {
        Ok(mut file) => {
            let mut buf = Vec::new();
            std::io::Read::read_to_end(&mut file, &mut buf).map_err(|err| ConnectorError::Sandbox(format!("cannot read memory file: {err}")))?;
            serde_json::from_slice(&buf).map_err(|err| ConnectorError::Sandbox(format!("stored memory is not valid json: {err}")))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Value::Null),
        Err(err) => Err(ConnectorError::Sandbox(format!("cannot open memory file: {err}"))),
    }
}

fn write_memory(dir: &Dir, file_name: &str, value: &Value) -> Result<(), ConnectorError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let mut file = dir.open_with(file_name, &options).map_err(|err| ConnectorError::Sandbox(format!("cannot open memory file for write: {err}")))?;
    let bytes = serde_json::to_vec(value).map_err(|err| ConnectorError::InvalidParams(err.to_string()))?;
    std::io::Write::write_all(&mut file, &bytes).map_err(|err| ConnectorError::Sandbox(format!("cannot write memory file: {err}")))
}

#[cfg(test)]
mod tests {
    use edon_core::ActionSource;
    use edon_core::RiskLevel;
    use edon_core::Timestamp;
    use edon_core::Tool;

    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap()
    }

    #[tokio::test]
    async fn read_before_any_write_returns_null() {
        let dir = tempfile::tempdir().unwrap();
        let connector = MemoryConnector::new(dir.path().to_path_buf(), TenantId::new());
        let action = Action::new(Tool::Memory, "read", json!({}), now(), ActionSource::Agent, RiskLevel::Low);
        let outcome = connector.invoke(&action, None).await;
        assert!(outcome.success);
        assert_eq!(outcome.result.unwrap()["value"], Value::Null);
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let tenant = TenantId::new();
        let connector = MemoryConnector::new(dir.path().to_path_buf(), tenant);
        let write_action = Action::new(Tool::Memory, "write", json!({"value": {"notes": ["a", "b"]}}), now(), ActionSource::Agent, RiskLevel::Low);
        assert!(connector.invoke(&write_action, None).await.success);

        let read_action = Action::new(Tool::Memory, "read", json!({}), now(), ActionSource::Agent, RiskLevel::Low);
        let outcome = connector.invoke(&read_action, None).await;
        assert_eq!(outcome.result.unwrap()["value"]["notes"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn two_tenants_do_not_share_a_memory_file() {
        let dir = tempfile::tempdir().unwrap();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let connector_a = MemoryConnector::new(dir.path().to_path_buf(), tenant_a);
        let connector_b = MemoryConnector::new(dir.path().to_path_buf(), tenant_b);
        let write_action = Action::new(Tool::Memory, "write", json!({"value": "a-only"}), now(), ActionSource::Agent, RiskLevel::Low);
        assert!(connector_a.invoke(&write_action, None).await.success);

        let read_action = Action::new(Tool::Memory, "read", json!({}), now(), ActionSource::Agent, RiskLevel::Low);
        let outcome_b = connector_b.invoke(&read_action, None).await;
        assert_eq!(outcome_b.result.unwrap()["value"], Value::Null);
    }
}
