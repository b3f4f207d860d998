// crates/edon-cli/src/main.rs
// ============================================================================
// Module: EDON Gateway CLI Entry Point
// Description: Command dispatcher for exercising a running gateway from a
// terminal: submit actions, inspect decisions, manage intents, policy
// packs and credentials.
// Purpose: Give an operator a local tool for the same REST surface an
// agent SDK would call, without hand-rolling curl invocations.
// Dependencies: clap, reqwest, edon-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! `edon-gate` is a thin wrapper over [`client::GatewayClient`]: every
//! subcommand builds a request, sends it, and pretty-prints the response
//! JSON (or a `{detail}` error body) to stdout. It carries no policy
//! logic of its own — all governance decisions are made by the gateway
//! it talks to.

mod client;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use serde_json::Value;
use serde_json::json;

use crate::client::GatewayClient;
use crate::error::CliError;

/// Operator CLI for the EDON governance gateway.
#[derive(Debug, Parser)]
#[command(name = "edon-gate", version, about = "Exercise a running EDON gateway from the command line")]
struct Cli {
    /// Base URL of the gateway, e.g. `http://127.0.0.1:8080`.
    #[arg(long, global = true, env = "EDON_GATEWAY_URL", default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Credential sent as `X-Edon-Token`; takes priority over `--bearer-token`.
    #[arg(long, global = true, env = "EDON_TOKEN")]
    token: Option<String>,

    /// Credential sent as `Authorization: Bearer`, used when `--token` is absent.
    #[arg(long, global = true, env = "EDON_BEARER_TOKEN")]
    bearer_token: Option<String>,

    /// Agent identifier sent as `X-Agent-Id`.
    #[arg(long, global = true, env = "EDON_AGENT_ID")]
    agent_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check gateway liveness (`GET /health`).
    Health,

    /// Submit a single action for governance (`POST /execute`).
    Execute {
        /// Tool wire name, e.g. `email`, `file`, `clawdbot`.
        #[arg(long)]
        tool: String,
        /// Operation name within the tool, e.g. `send`, `read`.
        #[arg(long)]
        op: String,
        /// Inline JSON object for the action's params.
        #[arg(long, conflicts_with = "params_file")]
        params: Option<String>,
        /// Path to a JSON file for the action's params.
        #[arg(long)]
        params_file: Option<PathBuf>,
        /// Estimated risk level: `low`, `medium`, `high`, or `critical`.
        #[arg(long)]
        estimated_risk: Option<String>,
        /// Intent to evaluate against, if not the tenant's current one.
        #[arg(long)]
        intent_id: Option<String>,
        /// Explicit credential id, overriding the tool's default convention.
        #[arg(long)]
        credential_id: Option<String>,
    },

    /// Invoke the delegated super-tool backend (`POST /clawdbot/invoke`).
    Clawdbot {
        /// Inline JSON object forwarded verbatim as the call's params.
        #[arg(long, conflicts_with = "params_file")]
        params: Option<String>,
        /// Path to a JSON file forwarded verbatim as the call's params.
        #[arg(long)]
        params_file: Option<PathBuf>,
        /// Intent to evaluate against, if not the tenant's current one.
        #[arg(long)]
        intent_id: Option<String>,
        /// Explicit credential id, overriding the configured default.
        #[arg(long)]
        credential_id: Option<String>,
    },

    /// Inspect past governance decisions.
    #[command(subcommand)]
    Decision(DecisionCommand),

    /// Manage the tenant's intent contract.
    #[command(subcommand)]
    Intent(IntentCommand),

    /// List and apply named policy packs.
    #[command(subcommand)]
    PolicyPack(PolicyPackCommand),

    /// Manage stored tool credentials.
    #[command(subcommand)]
    Credential(CredentialCommand),
}

#[derive(Debug, Subcommand)]
enum DecisionCommand {
    /// Fetch one decision by id (`GET /decisions/{id}`).
    Get {
        /// Decision id.
        id: String,
    },
    /// Query recent decisions (`GET /decisions/query`).
    Query {
        /// Filter to decisions governing this action id.
        #[arg(long)]
        action_id: Option<String>,
        /// Filter to decisions for this agent id.
        #[arg(long)]
        agent_id: Option<String>,
        /// Filter to decisions with this verdict (`ALLOW`, `BLOCK`, ...).
        #[arg(long)]
        verdict: Option<String>,
        /// Maximum number of results (1-1000, default 100).
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Per-day verdict counts (`GET /timeseries`).
    Timeseries,
    /// `BLOCK` verdict counts by reason code (`GET /block-reasons`).
    BlockReasons,
}

#[derive(Debug, Subcommand)]
enum IntentCommand {
    /// Replace the tenant's intent contract (`POST /intent/set`).
    Set {
        /// Free-text objective the intent authorizes.
        #[arg(long)]
        objective: String,
        /// Inline JSON array of scope entries.
        #[arg(long, conflicts_with = "scope_file")]
        scope: Option<String>,
        /// Path to a JSON file containing the scope array.
        #[arg(long)]
        scope_file: Option<PathBuf>,
        /// Inline JSON object of constraints.
        #[arg(long, conflicts_with = "constraints_file")]
        constraints: Option<String>,
        /// Path to a JSON file containing the constraints object.
        #[arg(long)]
        constraints_file: Option<PathBuf>,
        /// Inline JSON object for work hours, e.g. `{"start_hour":8,"end_hour":20,"offset_hours":0}`.
        #[arg(long)]
        work_hours: Option<String>,
    },
    /// Fetch the tenant's current intent (`GET /intent/get`).
    Get,
}

#[derive(Debug, Subcommand)]
enum PolicyPackCommand {
    /// List the built-in policy packs (`GET /policy-packs`).
    List,
    /// Apply a named policy pack to the tenant (`POST /policy-packs/{pack}/apply`).
    Apply {
        /// Policy pack name, e.g. `casual_user`, `founder_mode`.
        pack: String,
    },
}

#[derive(Debug, Subcommand)]
enum CredentialCommand {
    /// Store a credential (`POST /credentials/set`).
    Set {
        /// Credential id to store or overwrite.
        #[arg(long)]
        credential_id: String,
        /// Tool this credential is for.
        #[arg(long)]
        tool: String,
        /// Inline JSON object of credential data.
        #[arg(long, conflicts_with = "data_file")]
        data: Option<String>,
        /// Path to a JSON file containing the credential data.
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
    /// List stored credential summaries, never their data (`GET /credentials`).
    List,
    /// Delete a stored credential (`DELETE /credentials/{id}`).
    Delete {
        /// Credential id to delete.
        id: String,
    },
}

fn load_json(arg: &'static str, inline: Option<&str>, file: Option<&PathBuf>, default: Value) -> Result<Value, CliError> {
    if let Some(path) = file {
        let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.display().to_string(), source })?;
        return serde_json::from_str(&raw).map_err(|source| CliError::InvalidJson { arg, source });
    }
    if let Some(raw) = inline {
        return serde_json::from_str(raw).map_err(|source| CliError::InvalidJson { arg, source });
    }
    Ok(default)
}

async fn run(cli: Cli) -> Result<Value, CliError> {
    let client = GatewayClient::new(cli.base_url, cli.token, cli.bearer_token, cli.agent_id);

    match cli.command {
        Command::Health => client.get("/health").await,

        Command::Execute { tool, op, params, params_file, estimated_risk, intent_id, credential_id } => {
            let params = load_json("--params", params.as_deref(), params_file.as_ref(), json!({}))?;
            let mut action = json!({ "tool": tool, "op": op, "params": params });
            if let Some(risk) = estimated_risk {
                action["estimated_risk"] = Value::String(risk);
            }
            let mut body = json!({ "action": action });
            if let Some(intent_id) = intent_id {
                body["intent_id"] = Value::String(intent_id);
            }
            if let Some(credential_id) = credential_id {
                body["credential_id"] = Value::String(credential_id);
            }
            client.post("/execute", &body).await
        }

        Command::Clawdbot { params, params_file, intent_id, credential_id } => {
            let mut body = load_json("--params", params.as_deref(), params_file.as_ref(), json!({}))?;
            if let Some(credential_id) = credential_id {
                body["credential_id"] = Value::String(credential_id);
            }
            client.post_with_intent("/clawdbot/invoke", &body, intent_id.as_deref()).await
        }

        Command::Decision(DecisionCommand::Get { id }) => client.get(&format!("/decisions/{id}")).await,
        Command::Decision(DecisionCommand::Query { action_id, agent_id, verdict, limit }) => {
            let limit_str = limit.map(|value| value.to_string());
            client
                .get_with_query(
                    "/decisions/query",
                    &[
                        ("action_id", action_id.as_deref()),
                        ("agent_id", agent_id.as_deref()),
                        ("verdict", verdict.as_deref()),
                        ("limit", limit_str.as_deref()),
                    ],
                )
                .await
        }
        Command::Decision(DecisionCommand::Timeseries) => client.get("/timeseries").await,
        Command::Decision(DecisionCommand::BlockReasons) => client.get("/block-reasons").await,

        Command::Intent(IntentCommand::Set { objective, scope, scope_file, constraints, constraints_file, work_hours }) => {
            let scope = load_json("--scope", scope.as_deref(), scope_file.as_ref(), json!([]))?;
            let constraints = load_json("--constraints", constraints.as_deref(), constraints_file.as_ref(), json!({}))?;
            let mut body = json!({ "objective": objective, "scope": scope, "constraints": constraints });
            if let Some(raw) = work_hours {
                body["work_hours"] = serde_json::from_str(&raw).map_err(|source| CliError::InvalidJson { arg: "--work-hours", source })?;
            }
            client.post("/intent/set", &body).await
        }
        Command::Intent(IntentCommand::Get) => client.get("/intent/get").await,

        Command::PolicyPack(PolicyPackCommand::List) => client.get("/policy-packs").await,
        Command::PolicyPack(PolicyPackCommand::Apply { pack }) => client.post(&format!("/policy-packs/{pack}/apply"), &json!({})).await,

        Command::Credential(CredentialCommand::Set { credential_id, tool, data, data_file }) => {
            let data = load_json("--data", data.as_deref(), data_file.as_ref(), json!({}))?;
            let body = json!({ "credential_id": credential_id, "tool": tool, "data": data });
            client.post("/credentials/set", &body).await
        }
        Command::Credential(CredentialCommand::List) => client.get("/credentials").await,
        Command::Credential(CredentialCommand::Delete { id }) => client.delete(&format!("/credentials/{id}")).await,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_json_prefers_inline_over_default() {
        let value = load_json("--params", Some(r#"{"a":1}"#), None, json!({})).expect("parse");
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn load_json_falls_back_to_default_when_nothing_supplied() {
        let value = load_json("--params", None, None, json!({"default": true})).expect("parse");
        assert_eq!(value, json!({"default": true}));
    }

    #[test]
    fn load_json_reads_from_file_when_given() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"from_file": true}}"#).expect("write");
        let value = load_json("--params", None, Some(&file.path().to_path_buf()), json!({})).expect("parse");
        assert_eq!(value, json!({"from_file": true}));
    }

    #[test]
    fn load_json_rejects_invalid_inline_json() {
        let err = load_json("--params", Some("not json"), None, json!({})).expect_err("should fail");
        assert!(matches!(err, CliError::InvalidJson { arg: "--params", .. }));
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(value) => match output::write_json(&value) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                let _ = output::write_line(&format!("error: {err}"));
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            let _ = output::write_line(&format!("error: {err}"));
            ExitCode::FAILURE
        }
    }
}
