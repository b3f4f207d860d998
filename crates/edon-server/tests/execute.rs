// crates/edon-server/tests/execute.rs
// ============================================================================
// Module: Execute Endpoint Tests
// Description: Exercises `POST /execute` end to end: governance verdict,
// audit persistence, and (on an executable verdict) real connector
// dispatch against the sandboxed file root.
// Purpose: Confirm the pipeline → governor → connector → audit chain
// behaves the way `handlers::execute` documents, not just each stage in
// isolation.
// Dependencies: edon-server
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

mod common;

use axum::http::StatusCode;
use common::TestGateway;
use serde_json::json;

async fn set_file_read_write_intent(gateway: &TestGateway) {
    let (status, _) = gateway
        .request(
            "POST",
            "/intent/set",
            Some(json!({
                "objective": "manage files and documents in my workspace",
                "scope": [
                    {"tool": "file", "op": "read"},
                    {"tool": "file", "op": "write"}
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn in_scope_low_risk_write_is_allowed_and_executed() {
    let gateway = TestGateway::new().await;
    set_file_read_write_intent(&gateway).await;

    let (status, body) = gateway
        .request(
            "POST",
            "/execute",
            Some(json!({
                "action": {
                    "tool": "file",
                    "op": "write",
                    "params": {"path": "notes/a.txt", "content": "hello"},
                    "estimated_risk": "low"
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"], "ALLOW");
    assert_eq!(body["execution"]["status"], "succeeded");
}

#[tokio::test]
async fn out_of_scope_action_is_blocked_before_any_dispatch() {
    let gateway = TestGateway::new().await;
    // No intent set: falls back to the empty-scope deny-all contract.

    let (status, body) = gateway
        .request(
            "POST",
            "/execute",
            Some(json!({
                "action": {
                    "tool": "file",
                    "op": "write",
                    "params": {"path": "notes/a.txt", "content": "hello"},
                    "estimated_risk": "low"
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "a BLOCK verdict is still a successful governance response");
    assert_eq!(body["verdict"], "BLOCK");
    assert_eq!(body["reason_code"], "SCOPE_VIOLATION");
    assert!(body["execution"].is_null(), "a blocked action must never reach a connector");
}

#[tokio::test]
async fn drafts_only_constraint_degrades_an_email_send_to_a_draft() {
    let gateway = TestGateway::new().await;
    let (status, _) = gateway
        .request(
            "POST",
            "/intent/set",
            Some(json!({
                "objective": "send email updates to the team",
                "scope": [{"tool": "email", "op": "send"}],
                "constraints": {"drafts_only": true},
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = gateway
        .request(
            "POST",
            "/execute",
            Some(json!({
                "action": {
                    "tool": "email",
                    "op": "send",
                    "params": {"to": "teammate@example.com", "body": "status update"},
                    "estimated_risk": "low"
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verdict"], "DEGRADE");
    assert_eq!(body["safe_alternative"]["op"], "draft");
}

#[tokio::test]
async fn unscoped_intent_reference_is_not_found() {
    let gateway = TestGateway::new().await;
    set_file_read_write_intent(&gateway).await;

    let (status, _) = gateway
        .request(
            "POST",
            "/execute",
            Some(json!({
                "action": {"tool": "file", "op": "read", "params": {"path": "notes/a.txt"}},
                "intent_id": "00000000-0000-0000-0000-000000000000",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
