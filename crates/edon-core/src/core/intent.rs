// crates/edon-core/src/core/intent.rs
// ============================================================================
// Module: Intent Contracts
// Description: The tenant-declared statement of what an agent is allowed
// to do, and under what constraints.
// Purpose: Give the evaluator a typed view over scope and constraint data
// instead of ad-hoc JSON lookups at decision time.
// Dependencies: serde, serde_json, crate::core::identifiers
// ============================================================================

//! ## Overview
//! An [`IntentContract`] is the unit of policy a tenant sets once (via
//! `/intent/set` or a named preset applied through `/policy-packs`) and
//! the evaluator consults on every action. `scope` lists the
//! `(tool, op)` pairs allowed at all, and [`Constraints`] narrows further
//! (recipient caps, work-hours windows, sharing restrictions). Both are
//! read-only from the evaluator's perspective; only the pipeline's
//! intent-management handlers ever write a new contract.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::RiskLevel;
use crate::core::action::Tool;
use crate::core::identifiers::IntentId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

/// One allowed `(tool, op)` pair. `op == "*"` allows every operation on
/// that tool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeEntry {
    /// The tool this entry grants.
    pub tool: Tool,
    /// The operation this entry grants, or `"*"` for all operations.
    pub op: String,
}

impl ScopeEntry {
    /// Builds a scope entry.
    #[must_use]
    pub fn new(tool: Tool, op: impl Into<String>) -> Self {
        Self { tool, op: op.into() }
    }

    /// Whether this entry covers `(tool, op)`.
    #[must_use]
    pub fn covers(&self, tool: Tool, op: &str) -> bool {
        self.tool == tool && (self.op == "*" || self.op == op)
    }
}

/// Narrowing constraints layered on top of `scope`.
///
/// # Invariants
/// - Absent/`None` fields mean "unconstrained," never "deny all."
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Email/calendar actions may only produce drafts, never send/publish.
    #[serde(default)]
    pub drafts_only: bool,
    /// Op names the delegated backend may be asked to perform, or `None`
    /// for no restriction beyond `scope` itself.
    #[serde(default)]
    pub allowed_clawdbot_tools: Option<BTreeSet<String>>,
    /// Maximum recipients/targets a single sharing action may name.
    #[serde(default)]
    pub max_recipients: Option<u32>,
    /// Actions may only execute within the tenant's work-hours window.
    #[serde(default)]
    pub work_hours_only: bool,
    /// Actions that would share data with an external party are blocked
    /// outright rather than degraded.
    #[serde(default)]
    pub no_external_sharing: bool,
    /// Ambiguous-intent actions escalate instead of degrading.
    #[serde(default)]
    pub escalate_on_ambiguous_intent: bool,
}

impl Constraints {
    /// Returns the recipient cap, if the action's tool is unconstrained by
    /// `max_recipients` this always reads as "no cap."
    #[must_use]
    pub const fn max_recipients(&self) -> Option<u32> {
        self.max_recipients
    }
}

/// Work-hours window, in the tenant's local offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkHours {
    /// Inclusive start hour (0-23).
    pub start_hour: u8,
    /// Exclusive end hour (0-23).
    pub end_hour: u8,
}

impl WorkHours {
    /// Whether `hour` (0-23, already converted to the tenant's offset)
    /// falls inside this window.
    #[must_use]
    pub const fn contains_hour(self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            // Window wraps past midnight, e.g. 22:00-06:00.
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

fn default_intent_risk_level() -> RiskLevel {
    RiskLevel::Low
}

/// The tenant-declared statement of what an agent may do.
///
/// # Invariants
/// - Exactly one active `IntentContract` per tenant at a time; setting a
///   new one (directly or via a policy pack) fully replaces the prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentContract {
    /// Intent identifier.
    pub id: IntentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Free-text objective, used for keyword-alignment checks.
    pub objective: String,
    /// The set of `(tool, op)` pairs this intent permits.
    pub scope: Vec<ScopeEntry>,
    /// Narrowing constraints.
    pub constraints: Constraints,
    /// Work-hours window, when `constraints.work_hours_only` is set.
    pub work_hours: Option<WorkHours>,
    /// The risk level the tenant declared this intent at. Informational:
    /// the evaluator's escalation waiver keys on the action's own
    /// `computed_risk`, not this field.
    #[serde(default = "default_intent_risk_level")]
    pub risk_level: RiskLevel,
    /// Whether the tenant has pre-approved `High`-risk actions under this
    /// intent, letting a `computed_risk == High` decision skip the usual
    /// `ESCALATE` and proceed as `ALLOW`. Never waives `Critical` risk.
    #[serde(default)]
    pub approved_by_user: bool,
    /// When this contract was recorded.
    pub created_at: Timestamp,
}

impl IntentContract {
    /// Whether `(tool, op)` is within this contract's scope.
    #[must_use]
    pub fn allows(&self, tool: Tool, op: &str) -> bool {
        self.scope.iter().any(|entry| entry.covers(tool, op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_op_covers_any_operation() {
        let entry = ScopeEntry::new(Tool::Email, "*");
        assert!(entry.covers(Tool::Email, "send"));
        assert!(entry.covers(Tool::Email, "draft"));
        assert!(!entry.covers(Tool::Shell, "send"));
    }

    #[test]
    fn work_hours_window_wraps_midnight() {
        let window = WorkHours { start_hour: 22, end_hour: 6 };
        assert!(window.contains_hour(23));
        assert!(window.contains_hour(2));
        assert!(!window.contains_hour(12));
    }

    #[test]
    fn work_hours_window_is_same_day() {
        let window = WorkHours { start_hour: 9, end_hour: 17 };
        assert!(window.contains_hour(9));
        assert!(!window.contains_hour(17));
        assert!(!window.contains_hour(20));
    }

    use proptest::prelude::*;

    proptest! {
        // boundary invariant: start_hour is always inclusive, end_hour is
        // always exclusive, whether or not the window wraps past midnight.
        #[test]
        fn work_hours_boundary_is_inclusive_start_exclusive_end(start_hour in 0u8..24, end_hour in 0u8..24) {
            prop_assume!(start_hour != end_hour);
            let window = WorkHours { start_hour, end_hour };
            prop_assert!(window.contains_hour(start_hour));
            prop_assert!(!window.contains_hour(end_hour));
        }
    }
}
