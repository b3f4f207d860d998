// crates/edon-server/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared test utilities for the gateway's integration tests:
// a fresh `AppContext` over a temp-directory store and sandbox, a
// provisioned tenant with a known API key, and small HTTP request/response
// helpers over the in-process router.
// Purpose: Keep the boilerplate every `tests/*.rs` file needs (config,
// store, tenant, a way to call the router) in one place.
// Dependencies: edon-server, edon-config, edon-core, edon-store-sqlite,
// axum, tower, tempfile
// ============================================================================

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::body::to_bytes;
use axum::http::Request;
use axum::http::StatusCode;
use edon_config::AppConfig;
use edon_config::AuthConfig;
use edon_config::ConnectorsConfig;
use edon_config::EvaluatorSettings;
use edon_config::FeatureFlags;
use edon_config::LoggingConfig;
use edon_config::MagConfig;
use edon_config::MetricsConfig;
use edon_config::RateLimitTables;
use edon_config::SandboxConfig;
use edon_config::ServerConfig;
use edon_config::ServerMode;
use edon_config::StoreConfig;
use edon_core::ApiKeyId;
use edon_core::ApiKeyRecord;
use edon_core::Clock;
use edon_core::SystemClock;
use edon_core::Tenant;
use edon_core::TenantId;
use edon_core::TenantStatus;
use edon_core::hash_token;
use edon_server::router::build_router;
use edon_server::state::AppContext;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// A running gateway over a temp-directory store and sandbox, plus the
/// tenant and API key this test harness provisioned for it.
pub struct TestGateway {
    pub router: Router,
    pub tenant_id: TenantId,
    pub api_key: &'static str,
    _tmp: TempDir,
}

impl TestGateway {
    /// Builds a fresh gateway with one active tenant authenticated by a
    /// fixed API key, `server.mode` left at its `Development` default.
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let config = minimal_config(&tmp);
        std::fs::create_dir_all(&config.sandbox.email_root).expect("create email sandbox root");
        std::fs::create_dir_all(&config.sandbox.file_root).expect("create file sandbox root");
        std::fs::create_dir_all(&config.sandbox.calendar_root).expect("create calendar sandbox root");
        std::fs::create_dir_all(&config.sandbox.memory_root).expect("create memory sandbox root");
        let ctx = AppContext::build(config).expect("AppContext::build");

        let tenant_id = TenantId::new();
        let now = SystemClock.now();
        ctx.store
            .upsert_tenant(&Tenant { id: tenant_id, display_name: "test tenant".to_string(), status: TenantStatus::Active, created_at: now })
            .expect("upsert_tenant");

        let api_key = "test-api-key";
        ctx.store
            .upsert_api_key(&ApiKeyRecord {
                id: ApiKeyId::new("test-key"),
                tenant_id,
                token_hash: hash_token(api_key),
                created_at: now,
                active: true,
            })
            .expect("upsert_api_key");

        let router = build_router(Arc::new(ctx));
        Self { router, tenant_id, api_key, _tmp: tmp }
    }

    /// Sends a request to this gateway's router, authenticated with the
    /// provisioned API key unless `auth` is overridden.
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path).header("x-edon-token", self.api_key);
        let request = if let Some(body) = body {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(serde_json::to_vec(&body).expect("serialize body"))).expect("build request")
        } else {
            builder.body(Body::empty()).expect("build request")
        };
        self.send(request).await
    }

    /// Sends a request with no `x-edon-token` header at all.
    pub async fn request_unauthenticated(&self, method: &str, path: &str) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(path).body(Body::empty()).expect("build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.expect("read body");
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("parse json body") };
        (status, body)
    }
}

fn minimal_config(tmp: &TempDir) -> AppConfig {
    AppConfig {
        server: ServerConfig { mode: ServerMode::Development, ..ServerConfig::default() },
        store: StoreConfig { sqlite_path: tmp.path().join("gateway.db") },
        auth: AuthConfig::default(),
        rate_limit: RateLimitTables::default(),
        evaluator: EvaluatorSettings::default(),
        mag: MagConfig::default(),
        sandbox: SandboxConfig {
            email_root: tmp.path().join("sandbox/email"),
            file_root: tmp.path().join("sandbox/files"),
            calendar_root: tmp.path().join("sandbox/calendar"),
            memory_root: tmp.path().join("sandbox/memory"),
        },
        connectors: ConnectorsConfig::default(),
        flags: FeatureFlags::default(),
        metrics: MetricsConfig::default(),
        logging: LoggingConfig::default(),
    }
}
