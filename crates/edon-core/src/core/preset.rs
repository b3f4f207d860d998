// crates/edon-core/src/core/preset.rs
// ============================================================================
// Module: Policy Pack Presets
// Description: The named, pre-built intent-contract templates a tenant
// can apply in one call instead of hand-authoring scope/constraints.
// Purpose: Give operators a small, auditable set of starting postures
// instead of an open-ended policy DSL.
// Dependencies: serde, crate::core::{action, intent}
// ============================================================================

//! ## Overview
//! Six named presets cover the postures tenants actually use day to day.
//! `clawdbot_safe` is kept as an alias of `autonomy_mode` for callers that
//! still use the older name. Applying a preset fully replaces the
//! tenant's active [`crate::core::intent::IntentContract`] scope and
//! constraints; it never merges with whatever was active before.

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::Tool;
use crate::core::intent::Constraints;
use crate::core::intent::ScopeEntry;
use crate::core::intent::WorkHours;

/// The closed set of policy pack names a tenant may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyPackName {
    /// Read-mostly, low-stakes default for a single casual user.
    CasualUser,
    /// Research/search-heavy posture for market and research analysts.
    MarketAnalyst,
    /// Broad operational scope for a founder acting through the gateway.
    OpsCommander,
    /// The widest preset; a founder running most of their workflow through agents.
    FounderMode,
    /// Narrow, support-ticket-shaped scope for a helpdesk agent.
    Helpdesk,
    /// The delegated-backend-first preset; almost everything routes through Clawdbot.
    AutonomyMode,
}

impl PolicyPackName {
    /// Parses a policy pack name, accepting the `clawdbot_safe` alias for
    /// `autonomy_mode`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "casual_user" => Some(Self::CasualUser),
            "market_analyst" => Some(Self::MarketAnalyst),
            "ops_commander" => Some(Self::OpsCommander),
            "founder_mode" => Some(Self::FounderMode),
            "helpdesk" => Some(Self::Helpdesk),
            "autonomy_mode" | "clawdbot_safe" => Some(Self::AutonomyMode),
            _ => None,
        }
    }

    /// Returns the canonical wire name for this preset.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CasualUser => "casual_user",
            Self::MarketAnalyst => "market_analyst",
            Self::OpsCommander => "ops_commander",
            Self::FounderMode => "founder_mode",
            Self::Helpdesk => "helpdesk",
            Self::AutonomyMode => "autonomy_mode",
        }
    }

    /// All preset names, in a stable order, for listing endpoints.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::CasualUser,
            Self::MarketAnalyst,
            Self::OpsCommander,
            Self::FounderMode,
            Self::Helpdesk,
            Self::AutonomyMode,
        ]
    }

    /// Builds the scope entries this preset grants.
    #[must_use]
    pub fn scope(self) -> Vec<ScopeEntry> {
        match self {
            Self::CasualUser => vec![
                ScopeEntry::new(Tool::Email, "draft"),
                ScopeEntry::new(Tool::Calendar, "draft"),
                ScopeEntry::new(Tool::BraveSearch, "*"),
                ScopeEntry::new(Tool::Memory, "*"),
            ],
            Self::MarketAnalyst => vec![
                ScopeEntry::new(Tool::BraveSearch, "*"),
                ScopeEntry::new(Tool::Memory, "*"),
                ScopeEntry::new(Tool::File, "read"),
                ScopeEntry::new(Tool::Email, "draft"),
            ],
            Self::OpsCommander => vec![
                ScopeEntry::new(Tool::Email, "*"),
                ScopeEntry::new(Tool::Gmail, "*"),
                ScopeEntry::new(Tool::Calendar, "*"),
                ScopeEntry::new(Tool::GoogleCalendar, "*"),
                ScopeEntry::new(Tool::GitHub, "*"),
                ScopeEntry::new(Tool::Memory, "*"),
                ScopeEntry::new(Tool::BraveSearch, "*"),
            ],
            Self::FounderMode => vec![
                ScopeEntry::new(Tool::Email, "*"),
                ScopeEntry::new(Tool::Gmail, "*"),
                ScopeEntry::new(Tool::Calendar, "*"),
                ScopeEntry::new(Tool::GoogleCalendar, "*"),
                ScopeEntry::new(Tool::GitHub, "*"),
                ScopeEntry::new(Tool::File, "*"),
                ScopeEntry::new(Tool::Memory, "*"),
                ScopeEntry::new(Tool::BraveSearch, "*"),
                ScopeEntry::new(Tool::ElevenLabs, "*"),
                ScopeEntry::new(Tool::Clawdbot, "*"),
            ],
            Self::Helpdesk => vec![
                ScopeEntry::new(Tool::Email, "draft"),
                ScopeEntry::new(Tool::Memory, "read"),
                ScopeEntry::new(Tool::Memory, "write"),
            ],
            Self::AutonomyMode => vec![ScopeEntry::new(Tool::Clawdbot, "*"), ScopeEntry::new(Tool::Memory, "*")],
        }
    }

    /// Builds the constraints this preset applies.
    #[must_use]
    pub fn constraints(self) -> Constraints {
        match self {
            Self::CasualUser => Constraints {
                drafts_only: true,
                max_recipients: Some(5),
                no_external_sharing: true,
                escalate_on_ambiguous_intent: true,
                ..Constraints::default()
            },
            Self::MarketAnalyst => Constraints {
                drafts_only: true,
                no_external_sharing: true,
                ..Constraints::default()
            },
            Self::OpsCommander => {
                Constraints { max_recipients: Some(25), work_hours_only: true, ..Constraints::default() }
            }
            Self::FounderMode => Constraints {
                max_recipients: Some(100),
                allowed_clawdbot_tools: None,
                ..Constraints::default()
            },
            Self::Helpdesk => Constraints {
                drafts_only: true,
                max_recipients: Some(1),
                no_external_sharing: true,
                escalate_on_ambiguous_intent: true,
                ..Constraints::default()
            },
            Self::AutonomyMode => Constraints {
                allowed_clawdbot_tools: None,
                escalate_on_ambiguous_intent: true,
                ..Constraints::default()
            },
        }
    }

    /// Builds the work-hours window this preset applies, if any.
    #[must_use]
    pub const fn work_hours(self) -> Option<WorkHours> {
        match self {
            Self::OpsCommander => Some(WorkHours { start_hour: 8, end_hour: 20 }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clawdbot_safe_aliases_autonomy_mode() {
        assert_eq!(PolicyPackName::parse("clawdbot_safe"), Some(PolicyPackName::AutonomyMode));
    }

    #[test]
    fn unknown_name_does_not_parse() {
        assert_eq!(PolicyPackName::parse("not_a_pack"), None);
    }

    #[test]
    fn all_presets_round_trip_through_as_str() {
        for preset in PolicyPackName::all() {
            assert_eq!(PolicyPackName::parse(preset.as_str()), Some(preset));
        }
    }
}
