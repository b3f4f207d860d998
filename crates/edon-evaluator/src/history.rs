// crates/edon-evaluator/src/history.rs
// ============================================================================
// Module: Action History
// Description: The in-memory sliding-window ring the evaluator consults
// for loop detection and per-minute rate limiting.
// Purpose: Give `evaluate` a cheap, process-local view of "what has this
// process seen recently" without round-tripping to the store.
// Dependencies: std::sync::Mutex, edon-core
// ============================================================================

//! ## Overview
//! The history is a one-hour sliding window: every `record` appends an
//! entry, and every query first drops entries older than `now - 3600s`.
//! This bounds memory at `O(max_rate_per_minute * 60)` entries and keeps
//! `count_recent`/`count_all_recent` O(n) over a small n. The window is
//! per-process and intentionally not durable; losing it on restart only
//! costs a few seconds of loop/rate memory, which is an acceptable
//! trade against the cost of round-tripping every action to the store.

use std::sync::Mutex;

use edon_core::Action;
use edon_core::Timestamp;
use edon_core::Tool;
use edon_core::fingerprint;

const WINDOW_RETENTION_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct HistoryEntry {
    at: Timestamp,
    tool: Tool,
    op: String,
    fingerprint: String,
}

/// Sliding-window action history used for loop detection and
/// per-minute rate limiting.
///
/// # Invariants
/// - Entries older than 3600 seconds relative to the most recent query's
///   `now` are dropped before the query runs.
#[derive(Debug, Default)]
pub struct ActionHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl ActionHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Mutex::new(Vec::new()) }
    }

    /// Records `action` as observed at `now`, then prunes entries older
    /// than the one-hour retention window.
    pub fn record(&self, action: &Action, now: Timestamp) {
        let entry = HistoryEntry {
            at: now,
            tool: action.tool,
            op: action.op.clone(),
            fingerprint: fingerprint(action),
        };
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.push(entry);
        prune(&mut entries, now);
    }

    /// Counts entries matching `(tool, op, fingerprint)` within the last
    /// `window_secs` seconds, as of `now`.
    #[must_use]
    pub fn count_recent(&self, tool: Tool, op: &str, fingerprint: &str, now: Timestamp, window_secs: i64) -> u32 {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        prune(&mut entries, now);
        let cutoff = now.unix_seconds() - window_secs;
        entries
            .iter()
            .filter(|entry| {
                entry.at.unix_seconds() >= cutoff
                    && entry.tool == tool
                    && entry.op == op
                    && entry.fingerprint == fingerprint
            })
            .count() as u32
    }

    /// Counts every entry within the last `window_secs` seconds, as of
    /// `now`, regardless of tool or op.
    #[must_use]
    pub fn count_all_recent(&self, now: Timestamp, window_secs: i64) -> u32 {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        prune(&mut entries, now);
        let cutoff = now.unix_seconds() - window_secs;
        entries.iter().filter(|entry| entry.at.unix_seconds() >= cutoff).count() as u32
    }
}

fn prune(entries: &mut Vec<HistoryEntry>, now: Timestamp) {
    let cutoff = now.unix_seconds() - WINDOW_RETENTION_SECS;
    entries.retain(|entry| entry.at.unix_seconds() >= cutoff);
}

#[cfg(test)]
mod tests {
    use super::*;
    use edon_core::ActionSource;
    use edon_core::RiskLevel;
    use serde_json::json;

    fn action_at(tool: Tool, op: &str, at: &str) -> (Action, Timestamp) {
        let now = Timestamp::from_rfc3339(at).unwrap();
        (Action::new(tool, op, json!({}), now, ActionSource::Agent, RiskLevel::Low), now)
    }

    #[test]
    fn count_recent_matches_same_tool_op_and_fingerprint() {
        let history = ActionHistory::new();
        let (action, now) = action_at(Tool::Email, "send", "2026-01-01T00:00:00Z");
        history.record(&action, now);
        history.record(&action, now);
        let count = history.count_recent(Tool::Email, "send", &fingerprint(&action), now, 60);
        assert_eq!(count, 2);
    }

    #[test]
    fn entries_older_than_retention_window_are_pruned() {
        let history = ActionHistory::new();
        let (old_action, old_now) = action_at(Tool::Email, "send", "2026-01-01T00:00:00Z");
        history.record(&old_action, old_now);
        let later = Timestamp::from_rfc3339("2026-01-01T02:00:00Z").unwrap();
        let count = history.count_all_recent(later, 3600);
        assert_eq!(count, 0);
    }

    #[test]
    fn count_all_recent_ignores_tool_and_op() {
        let history = ActionHistory::new();
        let (a, now) = action_at(Tool::Email, "send", "2026-01-01T00:00:00Z");
        let (b, _) = action_at(Tool::Shell, "run", "2026-01-01T00:00:00Z");
        history.record(&a, now);
        history.record(&b, now);
        assert_eq!(history.count_all_recent(now, 60), 2);
    }
}
