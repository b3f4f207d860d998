// crates/edon-server/tests/policy_packs.rs
// ============================================================================
// Module: Policy Pack Handler Tests
// Description: Exercises `GET /policy-packs` and
// `POST /policy-packs/{pack}/apply`.
// Purpose: Confirm every preset is listed and that applying one fully
// replaces the tenant's active intent contract.
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

const ALL_PACKS: [&str; 6] =
    ["casual_user", "market_analyst", "ops_commander", "founder_mode", "helpdesk", "autonomy_mode"];

#[tokio::test]
async fn lists_all_six_presets() {
    let gateway = TestGateway::new().await;
    let (status, body) = gateway.request("GET", "/policy-packs", None).await;
    assert_eq!(status, StatusCode::OK);

    let packs = body["packs"].as_array().expect("packs array");
    assert_eq!(packs.len(), 6);
    for name in ALL_PACKS {
        assert!(packs.iter().any(|pack| pack["name"] == name), "missing preset {name}");
    }
}

#[tokio::test]
async fn applying_a_preset_replaces_the_active_intent() {
    let gateway = TestGateway::new().await;
    gateway
        .request(
            "POST",
            "/intent/set",
            Some(serde_json::json!({"objective": "hand-authored", "scope": [{"tool": "file", "op": "read"}]})),
        )
        .await;

    let (status, body) = gateway.request("POST", "/policy-packs/helpdesk/apply", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["scope"].as_array().expect("scope array").iter().any(|entry| entry["tool"] == "email" && entry["op"] == "draft"));

    let (status, get_body) = gateway.request("GET", "/intent/get", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(get_body["id"], body["id"]);
}

#[tokio::test]
async fn clawdbot_safe_aliases_autonomy_mode() {
    let gateway = TestGateway::new().await;
    let (status, body) = gateway.request("POST", "/policy-packs/clawdbot_safe/apply", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["scope"].as_array().expect("scope array").iter().any(|entry| entry["tool"] == "clawdbot"));
}

#[tokio::test]
async fn unknown_pack_name_is_not_found() {
    let gateway = TestGateway::new().await;
    let (status, _) = gateway.request("POST", "/policy-packs/not-a-real-pack/apply", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
