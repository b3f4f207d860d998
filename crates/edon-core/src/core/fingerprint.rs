// crates/edon-core/src/core/fingerprint.rs
// ============================================================================
// Module: Action Fingerprinting
// Description: Canonical, order-independent hashing of an action's
// (tool, op, params) for loop detection.
// Purpose: Let the evaluator recognize "the same action again" even when
// the caller serialized its params map with keys in a different order.
// Dependencies: serde_json, sha2, crate::core::action
// ============================================================================

//! ## Overview
//! Loop detection (spec.md's `LOOP_DETECTED` reason code) needs to
//! compare actions for semantic equality, not byte-for-byte JSON
//! equality. [`fingerprint`] canonicalizes `params` by recursively
//! sorting object keys before hashing, so two logically identical
//! payloads always fingerprint the same way regardless of field order.

use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;

use crate::core::action::Action;

/// Returns a stable hex digest identifying `(tool, op, params)`.
#[must_use]
pub fn fingerprint(action: &Action) -> String {
    let mut hasher = Sha256::new();
    hasher.update(action.tool.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(action.op.as_bytes());
    hasher.update(b"\0");
    hasher.update(canonical_json(&action.params).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Serializes `value` with object keys sorted recursively, so two
/// differently-ordered but equal JSON objects produce identical output.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
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

    fn action_with(params: Value) -> Action {
        Action::new(
            Tool::Email,
            "send",
            params,
            Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
            ActionSource::Agent,
            RiskLevel::Low,
        )
    }

    #[test]
    fn key_order_does_not_change_fingerprint() {
        let a = action_with(json!({"to": "x@example.com", "subject": "hi"}));
        let b = action_with(json!({"subject": "hi", "to": "x@example.com"}));
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn different_params_change_fingerprint() {
        let a = action_with(json!({"to": "x@example.com"}));
        let b = action_with(json!({"to": "y@example.com"}));
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn different_op_changes_fingerprint_even_with_same_params() {
        let mut a = action_with(json!({"to": "x@example.com"}));
        let mut b = a.clone();
        a.op = "send".to_string();
        b.op = "draft".to_string();
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
