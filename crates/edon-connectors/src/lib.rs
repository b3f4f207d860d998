// crates/edon-connectors/src/lib.rs
// ============================================================================
// Module: EDON Connector Registry
// Description: Uniform interface over the per-tool executors that perform
// a governed action's real side effect.
// Purpose: Give the pipeline one call shape (`invoke`) regardless of which
// tool an ALLOW/DEGRADE decision targets, and keep every connector's
// credential access scoped to a single request.
// Dependencies: edon-core, reqwest, cap-std, async-trait
// ============================================================================

//! ## Overview
//! A [`registry::ConnectorRegistry`] holds one [`registry::Connector`] per
//! [`edon_core::Tool`], built fresh for each request from the credential the
//! pipeline already resolved — connectors are never cached across requests,
//! so a credential rotation in the store takes effect on the very next call.
//! `sandbox` connectors never leave a configured root directory; `http_tool`
//! connectors speak to named external APIs over a hardened HTTP client;
//! `clawdbot` proxies to the delegated super-tool backend.

pub mod clawdbot;
pub mod http_tool;
pub mod memory;
pub mod registry;
pub mod sandbox;

pub use clawdbot::ClawdbotConfig;
pub use clawdbot::ClawdbotConnector;
pub use http_tool::HttpToolConfig;
pub use http_tool::HttpToolConnector;
pub use memory::MemoryConnector;
pub use registry::Connector;
pub use registry::ConnectorError;
pub use registry::ConnectorOutcome;
pub use registry::ConnectorRegistry;
pub use sandbox::EmailSandboxConnector;
pub use sandbox::FileSandboxConnector;
