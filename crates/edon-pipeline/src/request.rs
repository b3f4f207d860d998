// crates/edon-pipeline/src/request.rs
// ============================================================================
// Module: Request Context
// Description: The transport-agnostic view of an inbound request the
// pipeline stages consult, extracted once by the HTTP layer.
// Purpose: Keep every pipeline stage free of `axum`/`http` types so it can
// be unit tested without a running server, mirroring the teacher's
// `RequestContext` (decision-gate-mcp/src/auth.rs) which carries plain
// strings rather than transport handles.
// Dependencies: none
// ============================================================================

//! ## Overview
//! `edon-server` extracts an [`IncomingRequest`] from each `axum` request
//! before calling into this crate; nothing here depends on `axum` or
//! `http` so the pipeline stages stay testable as plain functions.

/// Which rate-limit table an endpoint draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    /// Governed/mutating endpoints: `/execute`, `/clawdbot/invoke`, intent
    /// and credential writes.
    Default,
    /// High-frequency read endpoints: `/decisions/query`, `/audit/query`,
    /// `/timeseries`, `/block-reasons`.
    Polling,
}

/// The transport-agnostic facts the pipeline needs about one request.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    /// Request path, used for the public-path allowlist.
    pub path: String,
    /// `X-EDON-TOKEN` header value, if present.
    pub edon_token: Option<String>,
    /// `Authorization: Bearer <token>` value, if present (fallback auth).
    pub bearer_token: Option<String>,
    /// `X-Agent-ID` header or query param.
    pub agent_id: Option<String>,
    /// `X-Intent-ID` header.
    pub intent_id: Option<String>,
    /// `X-Decision-ID` header, consulted by `MagValidation`.
    pub decision_id: Option<String>,
    /// `X-Tenant-ID` header; only honored outside production (dev escape
    /// hatch documented in spec.md §6).
    pub dev_tenant_id: Option<String>,
    /// `Content-Length`, when present, checked before the body is read.
    pub content_length: Option<u64>,
    /// Inline decision bundle carried in the body, if any (MAG fallback to
    /// the `X-Decision-ID` header).
    pub decision_bundle: Option<serde_json::Value>,
}

impl IncomingRequest {
    /// Returns whichever bearer credential the caller supplied, preferring
    /// the primary `X-EDON-TOKEN` header over the `Authorization` fallback.
    #[must_use]
    pub fn supplied_token(&self) -> Option<&str> {
        self.edon_token.as_deref().or(self.bearer_token.as_deref())
    }

    /// The rate-limit subject: `agent_id` if present, else `"anonymous"`.
    #[must_use]
    pub fn rate_limit_subject(&self) -> &str {
        self.agent_id.as_deref().unwrap_or("anonymous")
    }
}
