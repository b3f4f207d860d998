// crates/edon-server/tests/credentials.rs
// ============================================================================
// Module: Credential Handler Tests
// Description: Exercises `POST /credentials/set`, `GET /credentials`, and
// `DELETE /credentials/{id}`.
// Purpose: Confirm a tenant can provision and revoke credentials and that
// the listing endpoint never echoes secret `data` back.
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
async fn set_then_list_shows_a_summary_without_secret_data() {
    let gateway = TestGateway::new().await;

    let (status, set_body) = gateway
        .request(
            "POST",
            "/credentials/set",
            Some(json!({"credential_id": "gmail-main", "tool": "gmail", "data": {"refresh_token": "super-secret"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(set_body["credential_id"], "gmail-main");
    assert_eq!(set_body["tool"], "gmail");
    assert!(set_body.get("data").is_none(), "the set response must never echo secret data back");

    let (status, list_body) = gateway.request("GET", "/credentials", None).await;
    assert_eq!(status, StatusCode::OK);
    let credentials = list_body["credentials"].as_array().expect("credentials array");
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0]["credential_id"], "gmail-main");
    assert!(credentials[0].get("data").is_none(), "listing must never include secret data");
}

#[tokio::test]
async fn deleting_a_credential_removes_it_from_the_listing() {
    let gateway = TestGateway::new().await;
    gateway
        .request(
            "POST",
            "/credentials/set",
            Some(json!({"credential_id": "github-main", "tool": "github", "data": {"token": "ghp_xxx"}})),
        )
        .await;

    let (status, _) = gateway.request("DELETE", "/credentials/github-main", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list_body) = gateway.request("GET", "/credentials", None).await;
    assert_eq!(list_body["credentials"].as_array().expect("credentials array").len(), 0);
}

#[tokio::test]
async fn deleting_an_unknown_credential_is_not_an_error() {
    let gateway = TestGateway::new().await;
    let (status, _) = gateway.request("DELETE", "/credentials/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn a_tenants_credentials_are_invisible_to_another_tenant() {
    let gateway = TestGateway::new().await;
    gateway
        .request(
            "POST",
            "/credentials/set",
            Some(json!({"credential_id": "shared-name", "tool": "file", "data": {"k": "v"}})),
        )
        .await;

    let other = TestGateway::new().await;
    let (_, list_body) = other.request("GET", "/credentials", None).await;
    assert_eq!(list_body["credentials"].as_array().expect("credentials array").len(), 0);
}
