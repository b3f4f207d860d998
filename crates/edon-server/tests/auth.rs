// crates/edon-server/tests/auth.rs
// ============================================================================
// Module: Authentication Tests
// Description: Exercises the pipeline's authentication stage from outside
// any one handler: a missing credential, a credential for no tenant, and
// a valid one all land where the resolution order says they should.
// Purpose: Confirm auth failures surface as `401` before any governance
// or store work happens.
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
use tower::ServiceExt;

#[tokio::test]
async fn governed_endpoint_without_credential_is_unauthenticated() {
    let gateway = TestGateway::new().await;
    let (status, _) = gateway.request_unauthenticated("GET", "/intent/get").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_credential_is_unauthenticated() {
    let gateway = TestGateway::new().await;
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/intent/get")
        .header("x-edon-token", "not-a-real-token")
        .body(axum::body::Body::empty())
        .expect("build request");
    let response = gateway.router.clone().oneshot(request).await.expect("router response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_credential_reaches_the_handler() {
    let gateway = TestGateway::new().await;
    let (status, _) = gateway.request("GET", "/intent/get", None).await;
    // No intent set yet: the handler itself returns 404, proving auth
    // passed and the request reached past the pipeline preamble.
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn credential_never_authorizes_a_different_tenants_data() {
    let gateway = TestGateway::new().await;
    gateway
        .request(
            "POST",
            "/intent/set",
            Some(json!({"objective": "manage files and documents", "scope": [{"tool": "file", "op": "read"}]})),
        )
        .await;

    let other = TestGateway::new().await;
    let (status, _) = other.request("GET", "/intent/get", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "a fresh tenant must never see another tenant's intent");
}
