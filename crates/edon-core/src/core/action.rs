// crates/edon-core/src/core/action.rs
// ============================================================================
// Module: Proposed Actions
// Description: The side-effecting operation an agent proposes to the
// gateway, before and after risk computation.
// Purpose: Give the evaluator, connectors and audit log one shared,
// immutable representation of "what is being attempted."
// Dependencies: serde, serde_json, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! An [`Action`] is immutable after construction: the evaluator never
//! mutates it in place. Where policy needs a different operation (a
//! drafts-only degrade, a recipient-cap escalation) it builds a fresh
//! `Action` for the `safe_alternative` field of a [`crate::core::decision::Decision`]
//! rather than editing the original.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ActionId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Tool enumeration
// ============================================================================

/// Tools the gateway knows how to govern and, on ALLOW, execute.
///
/// # Invariants
/// - Variants are stable for serialization and policy-pack scope matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Sandboxed outbound email (draft/send).
    Email,
    /// Gmail connector.
    Gmail,
    /// Local shell execution (never ALLOWed without an explicit scope entry).
    Shell,
    /// Sandboxed calendar proposals.
    Calendar,
    /// Google Calendar connector.
    GoogleCalendar,
    /// Sandboxed filesystem access.
    File,
    /// Delegated super-tool backend proxy.
    Clawdbot,
    /// Web search connector.
    BraveSearch,
    /// Text-to-speech connector.
    ElevenLabs,
    /// Code host connector.
    GitHub,
    /// Persistent agent memory connector.
    Memory,
}

impl Tool {
    /// Returns the wire/scope-key string for this tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tool::Email => "email",
            Tool::Gmail => "gmail",
            Tool::Shell => "shell",
            Tool::Calendar => "calendar",
            Tool::GoogleCalendar => "google_calendar",
            Tool::File => "file",
            Tool::Clawdbot => "clawdbot",
            Tool::BraveSearch => "brave_search",
            Tool::ElevenLabs => "elevenlabs",
            Tool::GitHub => "github",
            Tool::Memory => "memory",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Risk level
// ============================================================================

/// Declared or computed risk band for an action.
///
/// # Invariants
/// - Ordered `Low < Medium < High < Critical`; `computed_risk` only ever
///   moves a `RiskLevel` upward from the agent's estimate, never down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk; the common case.
    Low,
    /// Medium risk; typically still auto-allowed.
    Medium,
    /// High risk; escalates unless the intent is user-approved.
    High,
    /// Critical risk; always escalates or blocks, never auto-allowed.
    Critical,
}

// ============================================================================
// SECTION: Action source
// ============================================================================

/// Who originated the action proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    /// An autonomous agent proposed the action.
    Agent,
    /// A human user proposed the action directly.
    User,
    /// The action arrived through the delegated-tool proxy.
    Delegated,
}

impl ActionSource {
    /// Returns the wire string for this source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionSource::Agent => "agent",
            ActionSource::User => "user",
            ActionSource::Delegated => "delegated",
        }
    }
}

impl std::fmt::Display for ActionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Action
// ============================================================================

/// A proposed side-effecting operation.
///
/// # Invariants
/// - Immutable after construction; policy rescue paths build new `Action`
///   values rather than editing this one.
/// - `computed_risk` starts `None` and is filled exactly once, by the
///   evaluator's first rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Action identifier.
    pub id: ActionId,
    /// Tool the action targets.
    pub tool: Tool,
    /// Operation name within the tool (e.g. `"send"`, `"draft"`, `"invoke"`).
    pub op: String,
    /// Opaque operation parameters.
    pub params: Value,
    /// When the action was requested.
    pub requested_at: Timestamp,
    /// Who proposed the action.
    pub source: ActionSource,
    /// Free-form tags; policy rescues append to this (e.g. `"degraded"`).
    pub tags: Vec<String>,
    /// The proposer's own risk estimate.
    pub estimated_risk: RiskLevel,
    /// Server-side computed risk, filled by the evaluator.
    pub computed_risk: Option<RiskLevel>,
}

impl Action {
    /// Creates a new action proposal with no computed risk yet.
    #[must_use]
    pub fn new(
        tool: Tool,
        op: impl Into<String>,
        params: Value,
        requested_at: Timestamp,
        source: ActionSource,
        estimated_risk: RiskLevel,
    ) -> Self {
        Self {
            id: ActionId::new(),
            tool,
            op: op.into(),
            params,
            requested_at,
            source,
            tags: Vec::new(),
            estimated_risk,
            computed_risk: None,
        }
    }

    /// Builds a copy of this action with a different `op`, appended tags,
    /// and `computed_risk` carried over — the shape every policy rescue
    /// (`drafts_only` degrade, recipient-cap escalation) needs for its
    /// `safe_alternative`.
    #[must_use]
    pub fn with_op_and_tags(&self, op: impl Into<String>, extra_tags: &[&str]) -> Self {
        let mut tags = self.tags.clone();
        tags.extend(extra_tags.iter().map(|t| (*t).to_string()));
        Self {
            id: self.id,
            tool: self.tool,
            op: op.into(),
            params: self.params.clone(),
            requested_at: self.requested_at,
            source: self.source,
            tags,
            estimated_risk: self.estimated_risk,
            computed_risk: self.computed_risk,
        }
    }

    /// Returns the structured logging fields for this action, excluding
    /// `params` (which may carry sensitive content and is never logged
    /// whole).
    #[must_use]
    pub fn log_fields(&self) -> [(&'static str, String); 4] {
        [
            ("action_id", self.id.to_string()),
            ("tool", self.tool.to_string()),
            ("op", self.op.clone()),
            ("source", self.source.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_action() -> Action {
        Action::new(
            Tool::Email,
            "send",
            json!({"recipients": ["a@example.com"]}),
            Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
            ActionSource::Agent,
            RiskLevel::Low,
        )
    }

    #[test]
    fn with_op_and_tags_preserves_identity_and_params() {
        let original = sample_action();
        let degraded = original.with_op_and_tags("draft", &["degraded"]);
        assert_eq!(degraded.id, original.id);
        assert_eq!(degraded.tool, original.tool);
        assert_eq!(degraded.source, original.source);
        assert_eq!(degraded.requested_at, original.requested_at);
        assert_eq!(degraded.op, "draft");
        assert_eq!(degraded.tags, vec!["degraded".to_string()]);
        assert_eq!(degraded.params, original.params);
    }

    #[test]
    fn tool_display_matches_scope_key() {
        assert_eq!(Tool::Clawdbot.to_string(), "clawdbot");
        assert_eq!(Tool::GoogleCalendar.as_str(), "google_calendar");
    }
}
