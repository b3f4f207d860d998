// crates/edon-server/tests/health.rs
// ============================================================================
// Module: Health Endpoint Tests
// Description: Exercises the one public, unauthenticated route.
// Purpose: Confirm liveness reporting works with no credential and a
// freshly opened store.
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

#[tokio::test]
async fn health_reports_ok_with_no_credential() {
    let gateway = TestGateway::new().await;
    let (status, body) = gateway.request_unauthenticated("GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "ok");
}
