// crates/edon-core/src/core/summary.rs
// ============================================================================
// Module: Safe Summaries
// Description: Helpers that keep internal detail out of caller-facing
// error text and audit explanations.
// Purpose: Enforce invariant 9 (spec.md §8) — no absolute filesystem
// paths or interpreter-style tracebacks ever reach a response body.
// Dependencies: none
// ============================================================================

/// Strips patterns that would leak host filesystem layout or raw
/// backtraces from an error detail before it is stored in an audit event
/// or returned to a caller.
///
/// This is a best-effort sanitizer, not a parser: it redacts absolute
/// Unix/Windows paths and any line mentioning `"traceback"` case
/// insensitively, leaving the rest of the message intact.
#[must_use]
pub fn redact_detail(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.to_ascii_lowercase().contains("traceback"))
        .map(redact_paths_in_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn redact_paths_in_line(line: &str) -> String {
    line.split_whitespace()
        .map(|word| if looks_like_absolute_path(word) { "[redacted-path]" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

fn looks_like_absolute_path(word: &str) -> bool {
    word.starts_with('/') && word.len() > 1 || (word.len() > 2 && word.as_bytes()[1] == b':' && word.contains('\\'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_traceback_lines() {
        let raw = "request failed\nTraceback (most recent call last):\n  File x";
        let redacted = redact_detail(raw);
        assert!(!redacted.to_ascii_lowercase().contains("traceback"));
    }

    #[test]
    fn redacts_absolute_unix_paths() {
        let redacted = redact_detail("could not open /home/user/.secrets/token for reading");
        assert!(!redacted.contains("/home/user"));
        assert!(redacted.contains("[redacted-path]"));
    }

    #[test]
    fn leaves_ordinary_text_untouched() {
        let redacted = redact_detail("rate limit exceeded for tenant");
        assert_eq!(redacted, "rate limit exceeded for tenant");
    }
}
