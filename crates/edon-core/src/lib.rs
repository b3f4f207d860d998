// crates/edon-core/src/lib.rs
// ============================================================================
// Module: EDON Core
// Description: Shared domain types for the EDON governance gateway.
// Purpose: Anchor crate depended on by every other EDON crate.
// ============================================================================

//! ## Overview
//! `edon-core` defines the data model shared by the evaluator, store,
//! connectors, pipeline and server crates: identifiers, the intent
//! contract, actions, decisions, audit events, credentials, tenancy, and
//! the closed error-kind set. Nothing in this crate performs I/O.

pub mod core;
pub mod error;
pub mod logging;

pub use crate::core::action::Action;
pub use crate::core::action::ActionSource;
pub use crate::core::action::RiskLevel;
pub use crate::core::action::Tool;
pub use crate::core::audit::AuditEvent;
pub use crate::core::audit::ExecutionOutcome;
pub use crate::core::credential::Credential;
pub use crate::core::credential::CredentialKey;
pub use crate::core::credential::CredentialSummary;
pub use crate::core::decision::Decision;
pub use crate::core::decision::EscalationOption;
pub use crate::core::decision::ReasonCode;
pub use crate::core::decision::Verdict;
pub use crate::core::decision::POLICY_VERSION;
pub use crate::core::fingerprint::fingerprint;
pub use crate::core::identifiers::ActionId;
pub use crate::core::identifiers::AgentId;
pub use crate::core::identifiers::ApiKeyId;
pub use crate::core::identifiers::ChannelTokenId;
pub use crate::core::identifiers::ConnectCodeId;
pub use crate::core::identifiers::CredentialId;
pub use crate::core::identifiers::DecisionId;
pub use crate::core::identifiers::IntentId;
pub use crate::core::identifiers::TenantId;
pub use crate::core::identifiers::UserId;
pub use crate::core::intent::Constraints;
pub use crate::core::intent::IntentContract;
pub use crate::core::intent::ScopeEntry;
pub use crate::core::intent::WorkHours;
pub use crate::core::preset::PolicyPackName;
pub use crate::core::ratelimit::RateLimitClass;
pub use crate::core::ratelimit::RateLimitCounter;
pub use crate::core::ratelimit::RateLimitWindow;
pub use crate::core::summary::redact_detail;
pub use crate::core::tenant::ApiKeyRecord;
pub use crate::core::tenant::ChannelTokenRecord;
pub use crate::core::tenant::Tenant;
pub use crate::core::tenant::TenantStatus;
pub use crate::core::tenant::User;
pub use crate::core::time::Clock;
pub use crate::core::time::SharedClock;
pub use crate::core::time::SystemClock;
pub use crate::core::time::Timestamp;
pub use crate::core::token::hash_token;
pub use error::GatewayError;
