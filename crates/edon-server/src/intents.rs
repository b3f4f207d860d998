// crates/edon-server/src/intents.rs
// ============================================================================
// Module: Intent Resolution
// Description: Builds the fallback intent contracts handlers use when a
// tenant has not set one explicitly, or applies a named policy pack.
// Purpose: Keep "what does a tenant's intent look like when they haven't
// told us" in one place instead of scattering default-scope logic across
// handlers.
// Dependencies: edon-core
// ============================================================================

//! ## Overview
//! Two fallbacks matter here. [`default_deny_intent`] is what `/execute`
//! and `/clawdbot/invoke` fall back to when a tenant has never called
//! `/intent/set` or applied a policy pack: an intent with an empty scope,
//! which denies everything by construction rather than by a special case
//! in the evaluator. [`intent_from_preset`] is what `/policy-packs/{pack}/apply`
//! synthesizes: the preset's own scope and constraints, with the
//! delegated-tool invoke op always present so a tenant on any preset can
//! still reach Clawdbot through the governed proxy.

use edon_core::IntentContract;
use edon_core::IntentId;
use edon_core::PolicyPackName;
use edon_core::RiskLevel;
use edon_core::ScopeEntry;
use edon_core::TenantId;
use edon_core::Timestamp;
use edon_core::Tool;

/// Builds the empty-scope intent a tenant with no intent on record falls
/// back to. Denies every action, since `IntentContract::allows` requires a
/// covering scope entry and there are none.
#[must_use]
pub fn default_deny_intent(tenant_id: TenantId, now: Timestamp) -> IntentContract {
    IntentContract {
        id: IntentId::new(),
        tenant_id,
        objective: String::new(),
        scope: Vec::new(),
        constraints: Default::default(),
        work_hours: None,
        risk_level: RiskLevel::Low,
        approved_by_user: false,
        created_at: now,
    }
}

/// Synthesizes an intent contract from a named policy pack, always adding
/// the delegated-tool invoke op so the pack's tenant can still reach
/// Clawdbot through `/clawdbot/invoke` even if the preset's own scope
/// doesn't name it.
#[must_use]
pub fn intent_from_preset(tenant_id: TenantId, preset: PolicyPackName, now: Timestamp) -> IntentContract {
    let mut scope = preset.scope();
    if !scope.iter().any(|entry| entry.covers(Tool::Clawdbot, "invoke")) {
        scope.push(ScopeEntry::new(Tool::Clawdbot, "invoke"));
    }
    IntentContract {
        id: IntentId::new(),
        tenant_id,
        objective: format!("policy pack: {}", preset.as_str()),
        scope,
        constraints: preset.constraints(),
        work_hours: preset.work_hours(),
        risk_level: RiskLevel::Low,
        approved_by_user: false,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deny_intent_allows_nothing() {
        let intent = default_deny_intent(TenantId::new(), Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap());
        assert!(!intent.allows(Tool::Email, "draft"));
        assert!(intent.scope.is_empty());
    }

    #[test]
    fn preset_intent_always_allows_clawdbot_invoke() {
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let intent = intent_from_preset(TenantId::new(), PolicyPackName::CasualUser, now);
        assert!(intent.allows(Tool::Clawdbot, "invoke"));
    }

    #[test]
    fn preset_intent_does_not_duplicate_existing_clawdbot_scope() {
        let now = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let intent = intent_from_preset(TenantId::new(), PolicyPackName::AutonomyMode, now);
        let clawdbot_entries = intent.scope.iter().filter(|entry| entry.tool == Tool::Clawdbot).count();
        assert_eq!(clawdbot_entries, 1);
    }
}
