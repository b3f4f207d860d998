// crates/edon-config/src/docs.rs
// ============================================================================
// Module: Config Example Generator
// Description: Produces an annotated example `edon-gateway.toml`.
// Purpose: Give operators a starting configuration file instead of an
// empty one, and keep that example in one place instead of copy-pasted
// across docs and onboarding scripts.
// Dependencies: none
// ============================================================================

//! ## Overview
//! [`example_toml`] returns a complete, valid configuration with every
//! section present and commented. `edon-cli`'s `init-config` subcommand
//! writes this verbatim to disk for a new deployment to edit.

/// Returns an annotated example configuration, valid as written.
#[must_use]
pub fn example_toml() -> String {
    r#"# edon-gateway.toml
# Example configuration for the EDON governance gateway.

[server]
bind_addr = "0.0.0.0:8080"
mode = "development"           # "production" disables the env-token auth fallback
public_paths = ["/health"]

[store]
sqlite_path = "edon-gateway.db"

[auth]
# jwks_url = "https://auth.example.com/.well-known/jwks.json"
jwks_cache_ttl_secs = 600
allow_env_token_in_prod = false

[rate_limit.default]
per_minute = 60
per_hour = 1000
per_day = 10000

[rate_limit.anonymous]
per_minute = 10
per_hour = 100
per_day = 500

[rate_limit.polling]
per_minute = 120
per_hour = 5000
per_day = 50000

[evaluator]
loop_window_secs = 3600
loop_threshold = 5
max_actions_per_minute = 30
work_hours_start = 8
work_hours_end = 20
dangerous_patterns = ["rm -rf", "mkfs", "dd if=", "curl | sh"]
sharing_patterns = ["export", "forward", "share", "publish"]

[evaluator.objective_keywords]
email = ["email", "message", "inbox"]
calendar = ["schedule", "meeting", "calendar"]

[mag]
enabled = false
# ledger_url = "https://ledger.example.com"
timeout_ms = 2000

[sandbox]
email_root = "sandbox/email"
file_root = "sandbox/files"
calendar_root = "sandbox/calendar"
memory_root = "sandbox/memory"

[connectors.clawdbot]
invoke_url = "https://clawdbot.internal/invoke"
timeout_ms = 15000
default_credential_id = "clawdbot-default"

# [connectors.gmail]
# base_url = "https://gmail.example.com/api"

[flags]
credentials_strict = true
strict_validation = true
rate_limit_enabled = true
demo_mode = false

[metrics]
enabled = true

[logging]
env = "development"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn example_toml_parses_and_validates() {
        let parsed: AppConfig = toml::from_str(&example_toml()).unwrap();
        parsed.validate().unwrap();
    }
}
