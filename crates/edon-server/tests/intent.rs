// crates/edon-server/tests/intent.rs
// ============================================================================
// Module: Intent Handler Tests
// Description: Exercises `POST /intent/set` and `GET /intent/get`.
// Purpose: Confirm a tenant's intent round-trips through the store and
// that a tenant with no intent on record sees `404`, not an empty
// default contract.
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

#[tokio::test]
async fn no_intent_set_is_not_found() {
    let gateway = TestGateway::new().await;
    let (status, _) = gateway.request("GET", "/intent/get", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn set_then_get_round_trips_the_contract() {
    let gateway = TestGateway::new().await;

    let (status, set_body) = gateway
        .request(
            "POST",
            "/intent/set",
            Some(json!({
                "objective": "manage my calendar and schedule meetings",
                "scope": [{"tool": "calendar", "op": "propose"}],
                "constraints": {"max_recipients": 5},
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(set_body["objective"], "manage my calendar and schedule meetings");
    assert_eq!(set_body["scope"][0]["tool"], "calendar");
    assert_eq!(set_body["constraints"]["max_recipients"], 5);

    let (status, get_body) = gateway.request("GET", "/intent/get", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(get_body["id"], set_body["id"]);
    assert_eq!(get_body["objective"], set_body["objective"]);
}

#[tokio::test]
async fn setting_a_new_intent_fully_replaces_the_prior_one() {
    let gateway = TestGateway::new().await;
    gateway
        .request(
            "POST",
            "/intent/set",
            Some(json!({"objective": "first objective", "scope": [{"tool": "file", "op": "read"}]})),
        )
        .await;
    let (_, second) = gateway
        .request(
            "POST",
            "/intent/set",
            Some(json!({"objective": "second objective", "scope": [{"tool": "email", "op": "draft"}]})),
        )
        .await;

    let (status, get_body) = gateway.request("GET", "/intent/get", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(get_body["objective"], "second objective");
    assert_eq!(get_body["id"], second["id"]);
    assert_eq!(get_body["scope"].as_array().expect("scope array").len(), 1);
}
