// crates/edon-evaluator/src/rules.rs
// ============================================================================
// Module: Evaluation Rules
// Description: The fourteen-step rule order that turns a proposed action
// and its intent contract into a decision.
// Purpose: Implement `evaluate` as a small, ordered sequence of early
// returns, each corresponding to one governance rule, so the order
// itself documents precedence.
// Dependencies: edon-core, edon-config
// ============================================================================

//! ## Overview
//! Rules run in a fixed order; the first one that fires decides. Later
//! rules never reconsider a decision an earlier rule already returned.
//! Two rules (drafts-only degrade, recipient cap) build a `safe_alternative`
//! by calling [`edon_core::Action::with_op_and_tags`] rather than mutating
//! the original action, matching the immutability invariant on `Action`.

use edon_config::EvaluatorSettings;
use edon_core::Action;
use edon_core::Decision;
use edon_core::EscalationOption;
use edon_core::IntentContract;
use edon_core::ReasonCode;
use edon_core::RiskLevel;
use edon_core::Timestamp;
use edon_core::Tool;
use edon_core::fingerprint;

use crate::history::ActionHistory;

const RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// Evaluates `action` against `intent`, consulting `history` for loop and
/// rate checks, with `now` as the evaluator's only source of time.
///
/// Runs the governance rules in order; the first rule whose condition
/// holds determines the returned [`Decision`]. Never performs I/O and
/// never panics on caller-controlled input.
#[must_use]
pub fn evaluate(action: &Action, intent: &IntentContract, now: Timestamp, history: &ActionHistory, settings: &EvaluatorSettings) -> Decision {
    let computed_risk = compute_risk(action, settings);

    if let Some(decision) = drafts_only_degrade(action, intent, computed_risk) {
        return decision;
    }

    let in_scope = intent.allows(action.tool, &action.op);
    if !in_scope {
        return if computed_risk == RiskLevel::Critical {
            Decision::blocked(ReasonCode::RiskTooHigh, format!("dangerous operation blocked: {} (also out of scope)", action_label(action)))
        } else {
            Decision::blocked(ReasonCode::ScopeViolation, format!("action {} not in scope for this intent", action_label(action)))
        };
    }

    if let Some(decision) = clawdbot_sub_allowlist(action, intent) {
        return decision;
    }

    if intent.constraints.work_hours_only {
        if let Some(window) = intent.work_hours {
            let hour = now.hour_in_offset(time::UtcOffset::UTC);
            if !window.contains_hour(hour) {
                return Decision::blocked(
                    ReasonCode::OutOfHours,
                    format!("action requested outside work hours (hour {hour}, window {}-{})", window.start_hour, window.end_hour),
                );
            }
        }
    }

    history.record(action, now);

    let action_fingerprint = fingerprint(action);
    if history.count_recent(action.tool, &action.op, &action_fingerprint, now, i64::try_from(settings.loop_window_secs).unwrap_or(i64::MAX))
        >= settings.loop_threshold
    {
        return Decision::paused(
            ReasonCode::LoopDetected,
            format!("loop detected: {} repeated {}+ times in {}s", action_label(action), settings.loop_threshold, settings.loop_window_secs),
        );
    }

    if history.count_all_recent(now, RATE_LIMIT_WINDOW_SECS) >= settings.max_actions_per_minute {
        return Decision::paused(
            ReasonCode::RateLimit,
            format!("rate limit exceeded: {} actions per minute", settings.max_actions_per_minute),
        );
    }

    if action.tool == Tool::Shell && is_dangerous_command(action, settings) {
        return Decision::blocked(ReasonCode::RiskTooHigh, "dangerous shell command detected".to_string());
    }

    if intent.constraints.no_external_sharing && is_external_sharing(action, settings) {
        return Decision::blocked(ReasonCode::DataExfil, format!("external sharing detected in {} operation", action.op));
    }

    if let Some(decision) = recipient_cap_escalation(action, intent, computed_risk) {
        return decision;
    }

    if requires_risk_escalation(computed_risk, intent) {
        return Decision::escalate(
            format!("high/critical risk action requires user confirmation (risk: {computed_risk:?})"),
            "this action carries elevated risk. proceed anyway?",
            vec![EscalationOption::new("allow_once", "Allow once"), EscalationOption::new("keep_blocking", "Cancel")],
            None,
        );
    }

    if let Some(decision) = objective_alignment(action, intent) {
        return decision;
    }

    Decision::approved("action approved: within scope, constraints satisfied, risk acceptable")
}

fn action_label(action: &Action) -> String {
    format!("{}.{}", action.tool, action.op)
}

/// Step 1: compute server-side risk from the agent's estimate, promoting
/// shell actions with a dangerous command to `critical`.
fn compute_risk(action: &Action, settings: &EvaluatorSettings) -> RiskLevel {
    if action.tool == Tool::Shell && is_dangerous_command(action, settings) {
        return RiskLevel::Critical;
    }
    action.estimated_risk
}

/// Step 2: rescue an email send into a draft when `drafts_only` is set,
/// before the scope check so it can rescue an otherwise out-of-scope send.
fn drafts_only_degrade(action: &Action, intent: &IntentContract, computed_risk: RiskLevel) -> Option<Decision> {
    if !intent.constraints.drafts_only || action.tool != Tool::Email || action.op != "send" {
        return None;
    }
    let mut draft = action.with_op_and_tags("draft", &["degraded"]);
    draft.computed_risk = Some(computed_risk);
    Some(Decision::degrade("intent requires drafts_only; degrading send to draft", draft))
}

/// Step 4: for a delegated-tool invoke, require the inner tool name to be
/// in the intent's allowlist when one is configured.
fn clawdbot_sub_allowlist(action: &Action, intent: &IntentContract) -> Option<Decision> {
    if action.tool != Tool::Clawdbot || action.op != "invoke" {
        return None;
    }
    let allowed = intent.constraints.allowed_clawdbot_tools.as_ref()?;
    if allowed.is_empty() {
        return None;
    }
    let inner_tool = action.params.get("tool").and_then(|v| v.as_str()).unwrap_or_default();
    if allowed.contains(inner_tool) {
        None
    } else {
        Some(Decision::blocked(
            ReasonCode::ScopeViolation,
            format!("clawdbot tool '{inner_tool}' not in allowed list"),
        ))
    }
}

fn is_dangerous_command(action: &Action, settings: &EvaluatorSettings) -> bool {
    let Some(command) = action.params.get("command").and_then(|v| v.as_str()) else {
        return false;
    };
    let command_lower = command.to_ascii_lowercase();
    settings.dangerous_patterns.iter().any(|pattern| command_lower.contains(&pattern.to_ascii_lowercase()))
}

fn is_external_sharing(action: &Action, settings: &EvaluatorSettings) -> bool {
    let op_lower = action.op.to_ascii_lowercase();
    if settings.sharing_patterns.iter().any(|pattern| op_lower.contains(&pattern.to_ascii_lowercase())) {
        return true;
    }
    let params_lower = action.params.to_string().to_ascii_lowercase();
    settings.sharing_patterns.iter().any(|pattern| params_lower.contains(&pattern.to_ascii_lowercase()))
}

/// Step 11: escalate a send that names more recipients than the intent
/// allows, offering a drafts-only safe alternative.
fn recipient_cap_escalation(action: &Action, intent: &IntentContract, computed_risk: RiskLevel) -> Option<Decision> {
    let max_recipients = intent.constraints.max_recipients()?;
    if action.op != "send" {
        return None;
    }
    let recipient_count = count_recipients(action);
    if recipient_count <= max_recipients {
        return None;
    }
    let mut draft = action.with_op_and_tags("draft", &["degraded", "too_many_recipients"]);
    draft.computed_risk = Some(computed_risk);
    Some(Decision::escalate(
        format!("recipient count ({recipient_count}) exceeds max ({max_recipients}); requires confirmation"),
        format!("send to {recipient_count} recipients? (max allowed: {max_recipients})"),
        vec![
            EscalationOption::new("allow_once", "Allow once"),
            EscalationOption::new("draft_only", "Save as draft only"),
            EscalationOption::new("keep_blocking", "Keep blocking"),
        ],
        Some(draft),
    ))
}

fn count_recipients(action: &Action) -> u32 {
    match action.params.get("recipients") {
        Some(serde_json::Value::Array(items)) => u32::try_from(items.len()).unwrap_or(u32::MAX),
        Some(serde_json::Value::String(raw)) => u32::try_from(raw.split(',').filter(|s| !s.trim().is_empty()).count()).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Step 12: escalate when computed risk is high or critical, unless the
/// intent was pre-approved at `high` by the user (critical always escalates).
fn requires_risk_escalation(computed_risk: RiskLevel, intent: &IntentContract) -> bool {
    matches!(computed_risk, RiskLevel::High | RiskLevel::Critical)
        && !(intent_approved_high(intent) && computed_risk == RiskLevel::High)
}

fn intent_approved_high(intent: &IntentContract) -> bool {
    intent.approved_by_user
}

/// Step 13: block (or, if the objective is short and the intent opts in,
/// escalate) when the action's tool does not align with any objective
/// keyword.
fn objective_alignment(action: &Action, intent: &IntentContract) -> Option<Decision> {
    if keywords_align(action, intent) {
        return None;
    }
    let objective_short = intent.objective.trim().chars().count() < 15;
    if objective_short && intent.constraints.escalate_on_ambiguous_intent {
        return Some(Decision::escalate(
            "intent is ambiguous; please clarify",
            "what would you like to do? (e.g. search, send email, create calendar event)",
            vec![EscalationOption::new("clarify", "I'll clarify"), EscalationOption::new("keep_blocking", "Cancel")],
            None,
        ));
    }
    Some(Decision::blocked(
        ReasonCode::IntentMismatch,
        format!("action does not align with intent objective: {}", intent.objective),
    ))
}

fn keywords_align(action: &Action, intent: &IntentContract) -> bool {
    let Some(keywords) = default_objective_keywords(action.tool) else {
        return true;
    };
    let objective_lower = intent.objective.to_ascii_lowercase();
    keywords.iter().any(|keyword| objective_lower.contains(keyword))
}

fn default_objective_keywords(tool: Tool) -> Option<&'static [&'static str]> {
    Some(match tool {
        Tool::Email => &["email", "inbox", "message", "mail"],
        Tool::Gmail => &["gmail", "inbox", "email", "mail"],
        Tool::Calendar => &["calendar", "meeting", "schedule", "event"],
        Tool::GoogleCalendar => &["calendar", "event", "schedule", "meeting"],
        Tool::File => &["file", "document", "folder"],
        Tool::Shell => &["command", "system", "terminal"],
        Tool::BraveSearch => &["search", "web", "research", "look up", "find"],
        Tool::ElevenLabs => &["voice", "speech", "tts", "read aloud", "storytelling"],
        Tool::GitHub => &["github", "repo", "issue", "code", "pr"],
        Tool::Memory => &["memory", "preference", "remember", "episode", "past task"],
        Tool::Clawdbot => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use edon_core::ActionSource;
    use edon_core::IntentId;
    use edon_core::ScopeEntry;
    use edon_core::TenantId;
    use edon_core::WorkHours;
    use serde_json::json;

    fn settings() -> EvaluatorSettings {
        EvaluatorSettings::default()
    }

    fn intent_with(scope: Vec<ScopeEntry>, objective: &str) -> IntentContract {
        IntentContract {
            id: IntentId::new(),
            tenant_id: TenantId::new(),
            objective: objective.to_string(),
            scope,
            constraints: edon_core::Constraints::default(),
            work_hours: None,
            risk_level: RiskLevel::Low,
            approved_by_user: false,
            created_at: Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
        }
    }

    fn action(tool: Tool, op: &str, params: serde_json::Value) -> Action {
        Action::new(tool, op, params, Timestamp::from_rfc3339("2026-01-02T10:00:00Z").unwrap(), ActionSource::Agent, RiskLevel::Low)
    }

    #[test]
    fn out_of_scope_action_is_blocked() {
        let intent = intent_with(vec![], "send emails for the team");
        let action = action(Tool::Email, "send", json!({}));
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Block);
        assert_eq!(decision.reason_code, ReasonCode::ScopeViolation);
    }

    #[test]
    fn drafts_only_degrades_send_even_when_out_of_scope() {
        let mut intent = intent_with(vec![], "send emails for the team");
        intent.constraints.drafts_only = true;
        let action = action(Tool::Email, "send", json!({}));
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Degrade);
        assert_eq!(decision.safe_alternative.unwrap().op, "draft");
    }

    #[test]
    fn dangerous_shell_command_blocks_even_if_in_scope() {
        let intent = intent_with(vec![ScopeEntry::new(Tool::Shell, "*")], "run system commands");
        let action = action(Tool::Shell, "run", json!({"command": "rm -rf /"}));
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Block);
        assert_eq!(decision.reason_code, ReasonCode::RiskTooHigh);
    }

    #[test]
    fn loop_detection_pauses_after_threshold_repeats() {
        let intent = intent_with(vec![ScopeEntry::new(Tool::Email, "*")], "send emails for the team");
        let history = ActionHistory::new();
        let mut config = settings();
        config.loop_threshold = 2;
        let action = action(Tool::Email, "draft", json!({"to": "a@example.com"}));
        let first = evaluate(&action, &intent, action.requested_at, &history, &config);
        assert_eq!(first.verdict, edon_core::Verdict::Allow);
        let second = evaluate(&action, &intent, action.requested_at, &history, &config);
        assert_eq!(second.verdict, edon_core::Verdict::Pause);
        assert_eq!(second.reason_code, ReasonCode::LoopDetected);
    }

    #[test]
    fn recipient_cap_escalates_with_draft_alternative() {
        let mut intent = intent_with(vec![ScopeEntry::new(Tool::Email, "*")], "send emails for the team");
        intent.constraints.max_recipients = Some(2);
        let action = action(Tool::Email, "send", json!({"recipients": ["a@x.com", "b@x.com", "c@x.com"]}));
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Escalate);
        assert!(decision.safe_alternative.is_some());
    }

    #[test]
    fn high_risk_action_escalates_by_default() {
        let intent = intent_with(vec![ScopeEntry::new(Tool::GitHub, "*")], "manage repo issues and code");
        let action = Action::new(
            Tool::GitHub,
            "create_issue",
            json!({}),
            Timestamp::from_rfc3339("2026-01-02T10:00:00Z").unwrap(),
            ActionSource::Agent,
            RiskLevel::High,
        );
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Escalate);
        assert_eq!(decision.reason_code, ReasonCode::NeedConfirmation);
    }

    #[test]
    fn high_risk_action_is_allowed_when_intent_pre_approves_it() {
        let mut intent = intent_with(vec![ScopeEntry::new(Tool::GitHub, "*")], "manage repo issues and code");
        intent.approved_by_user = true;
        let action = Action::new(
            Tool::GitHub,
            "create_issue",
            json!({}),
            Timestamp::from_rfc3339("2026-01-02T10:00:00Z").unwrap(),
            ActionSource::Agent,
            RiskLevel::High,
        );
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Allow);
    }

    #[test]
    fn critical_risk_always_escalates_even_when_pre_approved() {
        let mut intent = intent_with(vec![ScopeEntry::new(Tool::GitHub, "*")], "manage repo issues and code");
        intent.approved_by_user = true;
        let action = Action::new(
            Tool::GitHub,
            "create_issue",
            json!({}),
            Timestamp::from_rfc3339("2026-01-02T10:00:00Z").unwrap(),
            ActionSource::Agent,
            RiskLevel::Critical,
        );
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Escalate);
    }

    #[test]
    fn work_hours_violation_blocks_outside_window() {
        let mut intent = intent_with(vec![ScopeEntry::new(Tool::Calendar, "*")], "schedule a meeting");
        intent.constraints.work_hours_only = true;
        intent.work_hours = Some(WorkHours { start_hour: 9, end_hour: 17 });
        let late_night = Timestamp::from_rfc3339("2026-01-02T23:00:00Z").unwrap();
        let action = Action::new(Tool::Calendar, "draft", json!({}), late_night, ActionSource::Agent, RiskLevel::Low);
        let decision = evaluate(&action, &intent, late_night, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Block);
        assert_eq!(decision.reason_code, ReasonCode::OutOfHours);
    }

    #[test]
    fn intent_mismatch_blocks_when_objective_does_not_align() {
        let intent = intent_with(vec![ScopeEntry::new(Tool::GitHub, "*")], "write a long essay about gardening techniques");
        let action = action(Tool::GitHub, "create_issue", json!({}));
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Block);
        assert_eq!(decision.reason_code, ReasonCode::IntentMismatch);
    }

    #[test]
    fn short_ambiguous_objective_escalates_when_opted_in() {
        let mut intent = intent_with(vec![ScopeEntry::new(Tool::GitHub, "*")], "do stuff");
        intent.constraints.escalate_on_ambiguous_intent = true;
        let action = action(Tool::GitHub, "create_issue", json!({}));
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Escalate);
    }

    #[test]
    fn clean_action_within_scope_is_allowed() {
        let intent = intent_with(vec![ScopeEntry::new(Tool::BraveSearch, "*")], "search the web for research");
        let action = action(Tool::BraveSearch, "search", json!({"query": "rust async runtimes"}));
        let decision = evaluate(&action, &intent, action.requested_at, &ActionHistory::new(), &settings());
        assert_eq!(decision.verdict, edon_core::Verdict::Allow);
        assert_eq!(decision.reason_code, ReasonCode::Approved);
    }

    use proptest::prelude::*;

    fn recipients_value(count: u32) -> serde_json::Value {
        json!((0..count).map(|i| format!("r{i}@x.com")).collect::<Vec<_>>())
    }

    proptest! {
        // spec boundary: "exactly max_recipients+1 recipients -> ESCALATE
        // with draft alternative"; at or under the cap never escalates for
        // recipient count.
        #[test]
        fn recipient_cap_boundary_only_escalates_strictly_above_max(max_recipients in 1u32..30, over_by in 1u32..20) {
            let mut intent = intent_with(vec![ScopeEntry::new(Tool::Email, "*")], "send emails for the team");
            intent.constraints.max_recipients = Some(max_recipients);

            let at_cap = action(Tool::Email, "send", json!({"recipients": recipients_value(max_recipients)}));
            let at_cap_decision = evaluate(&at_cap, &intent, at_cap.requested_at, &ActionHistory::new(), &settings());
            prop_assert_eq!(at_cap_decision.verdict, edon_core::Verdict::Allow);

            let over_action = action(Tool::Email, "send", json!({"recipients": recipients_value(max_recipients + over_by)}));
            let over_decision = evaluate(&over_action, &intent, over_action.requested_at, &ActionHistory::new(), &settings());
            prop_assert_eq!(over_decision.verdict, edon_core::Verdict::Escalate);
            prop_assert_eq!(over_decision.reason_code, ReasonCode::NeedConfirmation);
            prop_assert_eq!(over_decision.safe_alternative.unwrap().op, "draft");
        }

        // spec boundary: "one action at the loop_threshold-th repetition
        // within the window -> PAUSE"; every repetition before that stays
        // ALLOW.
        #[test]
        fn loop_threshold_boundary_pauses_only_at_the_nth_repeat(threshold in 2u32..10) {
            let intent = intent_with(vec![ScopeEntry::new(Tool::Email, "*")], "send emails for the team");
            let history = ActionHistory::new();
            let mut config = settings();
            config.loop_threshold = threshold;
            let repeated = action(Tool::Email, "draft", json!({"to": "a@example.com"}));

            for _ in 0..threshold - 1 {
                let decision = evaluate(&repeated, &intent, repeated.requested_at, &history, &config);
                prop_assert_eq!(decision.verdict, edon_core::Verdict::Allow);
            }
            let final_decision = evaluate(&repeated, &intent, repeated.requested_at, &history, &config);
            prop_assert_eq!(final_decision.verdict, edon_core::Verdict::Pause);
            prop_assert_eq!(final_decision.reason_code, ReasonCode::LoopDetected);
        }
    }
}
