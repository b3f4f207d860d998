// crates/edon-connectors/src/sandbox.rs
// ============================================================================
// Module: Sandbox Connectors
// Description: Connectors that never leave a configured root directory.
// Purpose: Let `email` and `file` actions actually write somewhere without
// granting either tool real outbound access.
// Dependencies: edon-core, cap-std, cap-primitives, async-trait
// ============================================================================

//! ## Overview
//! Both connectors in this module are rooted at a fixed directory chosen at
//! construction time and open it once with [`cap_std::fs::Dir::open_ambient_dir`].
//! Every subsequent path is resolved relative to that open directory handle,
//! so a path that tries to escape the root (via `..`, an absolute path, or a
//! symlink) is rejected before any syscall touches it, following the same
//! `Component::Normal`-only check used for evidence-source file reads
//! elsewhere in this lineage.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;
use edon_core::Action;
use edon_core::Credential;
use serde_json::Value;
use serde_json::json;

use crate::registry::Connector;
use crate::registry::ConnectorError;
use crate::registry::ConnectorOutcome;

/// Rejects any relative path component that isn't a plain path segment.
fn sandboxed_relative_path(raw: &str) -> Result<PathBuf, ConnectorError> {
    let candidate = Path::new(raw);
    let mut safe = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => safe.push(part),
            _ => return Err(ConnectorError::Sandbox(format!("path escapes sandbox root: {raw}"))),
        }
    }
    if safe.as_os_str().is_empty() {
        return Err(ConnectorError::Sandbox("path must not be empty".to_string()));
    }
    Ok(safe)
}

fn string_param(action: &Action, key: &str) -> Result<String, ConnectorError> {
    action
        .params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConnectorError::InvalidParams(format!("missing string param: {key}")))
}

fn open_root(root: &Path) -> Result<Dir, ConnectorError> {
    Dir::open_ambient_dir(root, ambient_authority())
        .map_err(|err| ConnectorError::Sandbox(format!("cannot open sandbox root {}: {err}", root.display())))
}

fn write_rooted(root: &Dir, relative: &Path, bytes: &[u8]) -> Result<(), ConnectorError> {
    if let Some(parent) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
        root.create_dir_all(parent).map_err(|err| ConnectorError::Sandbox(format!("cannot create sandbox subdirectory: {err}")))?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let mut file = root.open_with(relative, &options).map_err(|err| ConnectorError::Sandbox(format!("cannot open sandbox file for write: {err}")))?;
    std::io::Write::write_all(&mut file, bytes).map_err(|err| ConnectorError::Sandbox(format!("cannot write sandbox file: {err}")))
}

fn read_rooted(root: &Dir, relative: &Path) -> Result<Vec<u8>, ConnectorError> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let mut file = root.open_with(relative, &options).map_err(|err| ConnectorError::Sandbox(format!("cannot open sandbox file for read: {err}")))?;
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut file, &mut buf).map_err(|err| ConnectorError::Sandbox(format!("cannot read sandbox file: {err}")))?;
    Ok(buf)
}

/// Writes drafted or sent email content into a per-tenant sandbox root.
///
/// # Invariants
/// - Never performs a real outbound send; `send` and `draft` both write a
///   file, the difference is only which subdirectory and tag land on it.
pub struct EmailSandboxConnector {
    root: PathBuf,
}

impl EmailSandboxConnector {
    /// Builds a connector rooted at `root`, which must already exist.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Connector for EmailSandboxConnector {
    async fn invoke(&self, action: &Action, _credential: Option<&Credential>) -> ConnectorOutcome {
        let root = self.root.clone();
        let action = action.clone();
        tokio::task::spawn_blocking(move || write_email(&root, &action)).await.map_or_else(
            |err| ConnectorOutcome::failure(format!("sandbox task panicked: {err}")),
            |result| result.map_or_else(|err| ConnectorOutcome::failure(err.to_string()), |path| ConnectorOutcome::success(json!({"written_to": path}))),
        )
    }
}

fn write_email(root: &Path, action: &Action) -> Result<String, ConnectorError> {
    let subdir = if action.op == "send" { "sent" } else { "drafts" };
    let relative = sandboxed_relative_path(&format!("{subdir}/{}.json", action.id))?;
    let dir = open_root(root)?;
    let body = serde_json::to_vec_pretty(&action.params).map_err(|err| ConnectorError::InvalidParams(err.to_string()))?;
    write_rooted(&dir, &relative, &body)?;
    Ok(relative.display().to_string())
}

/// Reads and writes files confined to a configured sandbox root.
pub struct FileSandboxConnector {
    root: PathBuf,
}

impl FileSandboxConnector {
    /// Builds a connector rooted at `root`, which must already exist.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Connector for FileSandboxConnector {
    async fn invoke(&self, action: &Action, _credential: Option<&Credential>) -> ConnectorOutcome {
        let root = self.root.clone();
        let action = action.clone();
        tokio::task::spawn_blocking(move || run_file_op(&root, &action)).await.map_or_else(
            |err| ConnectorOutcome::failure(format!("sandbox task panicked: {err}")),
            |result| result.map_or_else(|err| ConnectorOutcome::failure(err.to_string()), ConnectorOutcome::success),
        )
    }
}

fn run_file_op(root: &Path, action: &Action) -> Result<Value, ConnectorError> {
    let path_param = string_param(action, "path")?;
    let relative = sandboxed_relative_path(&path_param)?;
    let dir = open_root(root)?;
    match action.op.as_str() {
        "read" => {
            let bytes = read_rooted(&dir, &relative)?;
            let content = String::from_utf8(bytes).map_err(|err| ConnectorError::Sandbox(format!("file is not valid utf-8: {err}")))?;
            Ok(json!({"path": path_param, "content": content}))
        }
        "write" => {
            let content = string_param(action, "content")?;
            write_rooted(&dir, &relative, content.as_bytes())?;
            Ok(json!({"path": path_param, "written": true}))
        }
        other => Err(ConnectorError::InvalidParams(format!("unsupported file op: {other}"))),
    }
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
    async fn file_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FileSandboxConnector::new(dir.path().to_path_buf());
        let write_action = Action::new(Tool::File, "write", json!({"path": "notes/a.txt", "content": "hello"}), now(), ActionSource::Agent, RiskLevel::Low);
        let write_outcome = connector.invoke(&write_action, None).await;
        assert!(write_outcome.success, "{:?}", write_outcome.error);

        let read_action = Action::new(Tool::File, "read", json!({"path": "notes/a.txt"}), now(), ActionSource::Agent, RiskLevel::Low);
        let read_outcome = connector.invoke(&read_action, None).await;
        assert!(read_outcome.success);
        assert_eq!(read_outcome.result.unwrap()["content"], json!("hello"));
    }

    #[tokio::test]
    async fn file_path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let connector = FileSandboxConnector::new(dir.path().to_path_buf());
        let action = Action::new(Tool::File, "read", json!({"path": "../outside.txt"}), now(), ActionSource::Agent, RiskLevel::Low);
        let outcome = connector.invoke(&action, None).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn email_draft_is_written_under_drafts_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let connector = EmailSandboxConnector::new(dir.path().to_path_buf());
        let action = Action::new(Tool::Email, "draft", json!({"to": "a@example.com", "body": "hi"}), now(), ActionSource::Agent, RiskLevel::Low);
        let outcome = connector.invoke(&action, None).await;
        assert!(outcome.success, "{:?}", outcome.error);
        let written_to = outcome.result.unwrap()["written_to"].as_str().unwrap().to_string();
        assert!(written_to.starts_with("drafts/"));
    }
}
