// crates/edon-pipeline/src/validation.rs
// ============================================================================
// Module: Request Validation
// Description: Structural and content checks applied to a request body
// after authentication, before it reaches a handler.
// Purpose: Bound CPU and memory an unauthenticated or malicious caller can
// force the gateway to spend on a single request, and reject obviously
// hostile payloads early.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Validation never mutates the payload; it only accepts or rejects.
//! `Content-Length` is checked before the body is read at all. Once parsed,
//! the JSON tree is walked recursively with depth, array-length and
//! string-length caps, and (in strict mode) every string is checked
//! against a small dangerous-pattern set.

use serde_json::Value;

const MAX_CONTENT_LENGTH_BYTES: u64 = 10 * 1024 * 1024;
const MAX_JSON_DEPTH: usize = 10;
const MAX_ARRAY_LENGTH: usize = 10_000;
const MAX_STRING_LENGTH: usize = 100_000;

const DANGEROUS_PATTERNS: &[&str] = &["<script", "javascript:", "onerror=", "onload=", "onclick="];

/// Rejects `content_length` before any body is read.
///
/// # Errors
///
/// Returns a detail string suitable for [`crate::error::PipelineError::InvalidRequest`]
/// when the declared length exceeds the gateway's cap.
pub fn check_content_length(content_length: Option<u64>) -> Result<(), String> {
    if let Some(len) = content_length
        && len > MAX_CONTENT_LENGTH_BYTES
    {
        return Err(format!("request body of {len} bytes exceeds the {MAX_CONTENT_LENGTH_BYTES} byte limit"));
    }
    Ok(())
}

/// Recursively validates a parsed JSON body's shape: depth, array length,
/// string length, and (in strict mode) a dangerous-pattern scan over every
/// string value. Object keys must always be strings, which `serde_json`
/// already guarantees for any value that parsed at all.
///
/// # Errors
///
/// Returns a caller-facing detail string on the first violation found.
pub fn validate_json(value: &Value, strict: bool) -> Result<(), String> {
    walk(value, 0, strict)
}

fn walk(value: &Value, depth: usize, strict: bool) -> Result<(), String> {
    if depth > MAX_JSON_DEPTH {
        return Err(format!("request body exceeds max nesting depth of {MAX_JSON_DEPTH}"));
    }
    match value {
        Value::String(text) => {
            if text.len() > MAX_STRING_LENGTH {
                return Err(format!("a string field exceeds the {MAX_STRING_LENGTH} byte limit"));
            }
            if strict && contains_dangerous_pattern(text) {
                return Err("a string field matches a disallowed pattern".to_string());
            }
            Ok(())
        }
        Value::Array(items) => {
            if items.len() > MAX_ARRAY_LENGTH {
                return Err(format!("an array exceeds the {MAX_ARRAY_LENGTH} element limit"));
            }
            items.iter().try_for_each(|item| walk(item, depth + 1, strict))
        }
        Value::Object(map) => map.values().try_for_each(|item| walk(item, depth + 1, strict)),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(()),
    }
}

fn contains_dangerous_pattern(text: &str) -> bool {
    let lowered = text.to_lowercase();
    DANGEROUS_PATTERNS.iter().any(|pattern| lowered.contains(pattern))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn oversized_content_length_is_rejected() {
        assert!(check_content_length(Some(11 * 1024 * 1024)).is_err());
        assert!(check_content_length(Some(1024)).is_ok());
        assert!(check_content_length(None).is_ok());
    }

    #[test]
    fn deeply_nested_body_is_rejected() {
        let mut value = json!("leaf");
        for _ in 0..15 {
            value = json!([value]);
        }
        assert!(validate_json(&value, false).is_err());
    }

    #[test]
    fn oversized_array_is_rejected() {
        let value = Value::Array(vec![Value::Bool(true); MAX_ARRAY_LENGTH + 1]);
        assert!(validate_json(&value, false).is_err());
    }

    #[test]
    fn strict_mode_rejects_script_tags() {
        let value = json!({"note": "<script>alert(1)</script>"});
        assert!(validate_json(&value, true).is_err());
        assert!(validate_json(&value, false).is_ok());
    }

    #[test]
    fn well_formed_body_passes() {
        let value = json!({"tool": "email", "op": "draft", "params": {"to": ["a@example.com"]}});
        assert!(validate_json(&value, true).is_ok());
    }
}
