// crates/edon-core/src/core/decision.rs
// ============================================================================
// Module: Decisions
// Description: The evaluator's output type and its closed reason-code set.
// Purpose: Give every caller (evaluator, pipeline, store, client) one
// stable shape for "what the gateway decided and why."
// Dependencies: serde, crate::core::action
// ============================================================================

//! ## Overview
//! [`Decision`] is intentionally a plain data record: the evaluator
//! constructs one and hands it to the caller, who persists it and may act
//! on `verdict`. Two constructors ([`Decision::degrade`],
//! [`Decision::escalate`]) enforce the invariants spec.md calls out —
//! DEGRADE always carries a `safe_alternative`, ESCALATE always carries a
//! question and at least one option — at the type level where the closed
//! constructor set makes violating them impossible from outside this
//! module.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::Action;

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Evaluator outcome for a proposed action.
///
/// # Invariants
/// - Variants are stable for serialization and client compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Action may execute unmodified.
    Allow,
    /// Action must not execute.
    Block,
    /// Action requires explicit user confirmation before it may execute.
    Escalate,
    /// A safer alternative action should execute instead.
    Degrade,
    /// Action is suspended pending operator attention (loop/rate limit).
    Pause,
    /// The evaluator could not produce a policy outcome.
    #[serde(rename = "ERROR")]
    Error,
}

impl Verdict {
    /// Whether a connector may be invoked for this verdict.
    ///
    /// Only `Allow` and `Degrade` are executable; every other verdict must
    /// short-circuit before any connector call (invariant 6, spec.md §8).
    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(self, Verdict::Allow | Verdict::Degrade)
    }
}

// ============================================================================
// SECTION: Reason code
// ============================================================================

/// Closed set of reasons a [`Decision`] may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Action satisfied scope, risk and constraint checks.
    Approved,
    /// `(tool, op)` is not present in the intent's scope.
    ScopeViolation,
    /// Computed risk is too high to allow, or a dangerous pattern matched.
    RiskTooHigh,
    /// Out of the intent's configured work-hours window.
    OutOfHours,
    /// Action matched a sharing/export pattern under `no_external_sharing`.
    DataExfil,
    /// Action keywords did not align with the intent's objective.
    IntentMismatch,
    /// Verdict requires explicit user confirmation.
    NeedConfirmation,
    /// Action was rewritten into a safer alternative.
    DegradedToSafeAlternative,
    /// Same `(tool, op, params)` repeated past the loop threshold.
    LoopDetected,
    /// Too many actions within the rate window.
    RateLimit,
}

// ============================================================================
// SECTION: Escalation option
// ============================================================================

/// One selectable option offered alongside an `ESCALATE` verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationOption {
    /// Stable option identifier (`"allow_once"`, `"draft_only"`, ...).
    pub id: String,
    /// Human-readable label for the option.
    pub label: String,
}

impl EscalationOption {
    /// Builds an escalation option from an id/label pair.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// The evaluator's output for a single proposed action.
///
/// # Invariants
/// - `verdict == Degrade` implies `safe_alternative.is_some()`.
/// - `verdict == Escalate` implies `escalation_question.is_some()` and
///   `escalation_options` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// The governed outcome.
    pub verdict: Verdict,
    /// The closed reason this verdict was reached.
    pub reason_code: ReasonCode,
    /// Human-readable explanation, safe to show to the caller.
    pub explanation: String,
    /// A safer action to execute instead of the original (DEGRADE only).
    pub safe_alternative: Option<Action>,
    /// Whether the caller must obtain explicit confirmation before acting.
    pub required_confirmation: bool,
    /// Policy pack / evaluator version that produced this decision.
    pub policy_version: String,
    /// The question to present to the user (ESCALATE only).
    pub escalation_question: Option<String>,
    /// Selectable responses to `escalation_question` (ESCALATE only).
    pub escalation_options: Option<Vec<EscalationOption>>,
}

/// Evaluator/policy-pack version embedded in every decision.
pub const POLICY_VERSION: &str = "1.0.0";

impl Decision {
    /// Builds an `ALLOW`/`APPROVED` decision.
    #[must_use]
    pub fn approved(explanation: impl Into<String>) -> Self {
        Self::plain(Verdict::Allow, ReasonCode::Approved, explanation)
    }

    /// Builds a `BLOCK` decision with the given reason.
    #[must_use]
    pub fn blocked(reason_code: ReasonCode, explanation: impl Into<String>) -> Self {
        Self::plain(Verdict::Block, reason_code, explanation)
    }

    /// Builds a `PAUSE` decision with the given reason.
    #[must_use]
    pub fn paused(reason_code: ReasonCode, explanation: impl Into<String>) -> Self {
        Self::plain(Verdict::Pause, reason_code, explanation)
    }

    /// Builds the generic, non-executable `ERROR` decision callers must
    /// treat as non-executable.
    #[must_use]
    pub fn error(explanation: impl Into<String>) -> Self {
        Self::plain(Verdict::Error, ReasonCode::Approved, explanation)
    }

    fn plain(verdict: Verdict, reason_code: ReasonCode, explanation: impl Into<String>) -> Self {
        Self {
            verdict,
            reason_code,
            explanation: explanation.into(),
            safe_alternative: None,
            required_confirmation: false,
            policy_version: POLICY_VERSION.to_string(),
            escalation_question: None,
            escalation_options: None,
        }
    }

    /// Builds a `DEGRADE` decision. Always carries `safe_alternative`,
    /// satisfying invariant 7 (spec.md §8) by construction.
    #[must_use]
    pub fn degrade(explanation: impl Into<String>, safe_alternative: Action) -> Self {
        Self {
            safe_alternative: Some(safe_alternative),
            ..Self::plain(Verdict::Degrade, ReasonCode::DegradedToSafeAlternative, explanation)
        }
    }

    /// Builds an `ESCALATE` decision. Always carries a question and at
    /// least one option, satisfying the ESCALATE invariant (spec.md §3)
    /// by construction.
    #[must_use]
    pub fn escalate(
        explanation: impl Into<String>,
        question: impl Into<String>,
        options: Vec<EscalationOption>,
        safe_alternative: Option<Action>,
    ) -> Self {
        assert!(!options.is_empty(), "ESCALATE must carry at least one option");
        Self {
            required_confirmation: true,
            escalation_question: Some(question.into()),
            escalation_options: Some(options),
            safe_alternative,
            ..Self::plain(Verdict::Escalate, ReasonCode::NeedConfirmation, explanation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::ActionSource;
    use crate::core::action::RiskLevel;
    use crate::core::action::Tool;
    use crate::core::time::Timestamp;
    use serde_json::json;

    fn sample_action() -> Action {
        Action::new(
            Tool::Email,
            "draft",
            json!({}),
            Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
            ActionSource::Agent,
            RiskLevel::Low,
        )
    }

    #[test]
    fn degrade_always_carries_safe_alternative() {
        let decision = Decision::degrade("rescued", sample_action());
        assert_eq!(decision.verdict, Verdict::Degrade);
        assert!(decision.safe_alternative.is_some());
    }

    #[test]
    fn escalate_always_carries_question_and_options() {
        let decision = Decision::escalate(
            "needs confirmation",
            "proceed?",
            vec![EscalationOption::new("allow_once", "Allow once")],
            None,
        );
        assert_eq!(decision.verdict, Verdict::Escalate);
        assert!(decision.escalation_question.is_some());
        assert!(!decision.escalation_options.unwrap().is_empty());
    }

    #[test]
    fn only_allow_and_degrade_are_executable() {
        assert!(Verdict::Allow.is_executable());
        assert!(Verdict::Degrade.is_executable());
        assert!(!Verdict::Block.is_executable());
        assert!(!Verdict::Escalate.is_executable());
        assert!(!Verdict::Pause.is_executable());
        assert!(!Verdict::Error.is_executable());
    }
}
