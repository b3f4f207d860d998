// crates/edon-core/src/core/audit.rs
// ============================================================================
// Module: Audit Events
// Description: The append-only record written for every governed action,
// whether it was allowed, blocked, escalated, degraded or paused.
// Purpose: Give operators a queryable, tenant-scoped trail of what the
// gateway decided and, where relevant, what the connector did about it.
// Dependencies: serde, serde_json, crate::core::{action, decision, identifiers, time}
// ============================================================================

//! ## Overview
//! An [`AuditEvent`] pairs one [`Action`] and the [`Decision`] the
//! evaluator reached for it, plus whatever the connector reported back
//! after execution (if the verdict was executable at all). Rows are
//! write-once: nothing in the gateway updates an `AuditEvent` after
//! insert, it only ever appends a new one.

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::Action;
use crate::core::decision::Decision;
use crate::core::identifiers::AgentId;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

/// What a connector reported after executing an `ALLOW`/`DEGRADE`d action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ExecutionOutcome {
    /// The verdict was non-executable (BLOCK/ESCALATE/PAUSE/ERROR); no
    /// connector was ever invoked.
    NotAttempted,
    /// The connector ran and reported success.
    Succeeded {
        /// Opaque, connector-specific result summary (no secrets).
        detail: String,
    },
    /// The connector ran and reported failure.
    Failed {
        /// Sanitized failure detail (see [`crate::core::summary::redact_detail`]).
        detail: String,
    },
}

/// One append-only audit record.
///
/// # Invariants
/// - `decision_id` is always [`DecisionId::derive`]`(action.id, decided_at)`.
/// - Rows are immutable once inserted; corrections append a new row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Deterministic decision identifier for this event.
    pub decision_id: DecisionId,
    /// Tenant this event belongs to.
    pub tenant_id: TenantId,
    /// Agent that proposed the action, if known.
    pub agent_id: Option<AgentId>,
    /// The action as proposed.
    pub action: Action,
    /// The evaluator's decision for that action.
    pub decision: Decision,
    /// When the decision was reached.
    pub decided_at: Timestamp,
    /// What happened when the connector (if any) acted on the decision.
    pub execution: ExecutionOutcome,
}

impl AuditEvent {
    /// Builds an audit event for an action/decision pair that has not yet
    /// been executed.
    #[must_use]
    pub fn pending(
        tenant_id: TenantId,
        agent_id: Option<AgentId>,
        action: Action,
        decision: Decision,
        decided_at: Timestamp,
    ) -> Self {
        let decision_id = DecisionId::derive(action.id, &decided_at);
        Self { decision_id, tenant_id, agent_id, action, decision, decided_at, execution: ExecutionOutcome::NotAttempted }
    }

    /// Records a connector's execution outcome on this event.
    #[must_use]
    pub fn with_execution(mut self, execution: ExecutionOutcome) -> Self {
        self.execution = execution;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::ActionSource;
    use crate::core::action::RiskLevel;
    use crate::core::action::Tool;
    use serde_json::json;

    #[test]
    fn decision_id_matches_derivation() {
        let action = Action::new(
            Tool::Email,
            "draft",
            json!({}),
            Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
            ActionSource::Agent,
            RiskLevel::Low,
        );
        let decided_at = Timestamp::from_rfc3339("2026-01-01T00:00:01Z").unwrap();
        let expected = DecisionId::derive(action.id, &decided_at);
        let event = AuditEvent::pending(
            TenantId::new(),
            None,
            action,
            Decision::approved("ok"),
            decided_at,
        );
        assert_eq!(event.decision_id, expected);
    }
}
