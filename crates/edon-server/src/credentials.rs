// crates/edon-server/src/credentials.rs
// ============================================================================
// Module: Credential Resolution
// Description: Picks which stored credential, if any, backs a dispatched
// action, and enforces the `credentials_strict` feature flag before a
// connector is ever invoked.
// Purpose: Keep the explicit-id / clawdbot-default / tool-name-convention
// lookup order in one place instead of repeating it in `/execute` and
// `/clawdbot/invoke`.
// Dependencies: edon-core, edon-store-sqlite
// ============================================================================

//! ## Overview
//! Not every tool needs a credential: the sandboxed connectors (email,
//! file, calendar, memory) operate against a local sandbox root and never
//! reach an external API. [`requires_credential`] names that exemption;
//! [`resolve`] only enforces `credentials_strict` for tools outside it, so
//! a strict deployment still lets sandboxed actions through with no
//! credential on record.

use edon_core::Credential;
use edon_core::CredentialKey;
use edon_core::GatewayError;
use edon_core::TenantId;
use edon_core::Tool;
use edon_store_sqlite::SqliteStore;

use crate::error::ApiError;
use crate::error::from_store_error;

/// Whether `tool` needs a credential at all. The sandboxed connectors act
/// on a local root directory and never call out with a key.
#[must_use]
pub fn requires_credential(tool: Tool) -> bool {
    !matches!(tool, Tool::Email | Tool::File | Tool::Calendar | Tool::Memory)
}

/// Resolves the credential id a dispatch should use: the caller's
/// explicit id, else Clawdbot's configured default, else the tool-name
/// convention (`credential_id == tool.as_str()`).
#[must_use]
pub fn credential_id_for(tool: Tool, explicit: Option<&str>, clawdbot_default_credential_id: &str) -> String {
    if let Some(id) = explicit {
        return id.to_string();
    }
    if tool == Tool::Clawdbot {
        return clawdbot_default_credential_id.to_string();
    }
    tool.as_str().to_string()
}

/// Looks up the credential a dispatch should use, enforcing
/// `credentials_strict` when `tool` actually needs one.
///
/// # Errors
///
/// Returns [`ApiError`] wrapping [`GatewayError::CredentialNotFound`] when
/// `strict` is set, `tool` needs a credential, and none is on record for
/// this tenant; returns [`ApiError`] wrapping a store failure on a lookup
/// error.
pub fn resolve(
    store: &SqliteStore,
    tenant_id: TenantId,
    tool: Tool,
    explicit_credential_id: Option<&str>,
    clawdbot_default_credential_id: &str,
    strict: bool,
) -> Result<Option<Credential>, ApiError> {
    let credential_id = credential_id_for(tool, explicit_credential_id, clawdbot_default_credential_id);
    let key = CredentialKey { credential_id: credential_id.clone().into(), tenant_id: Some(tenant_id) };
    let credential = store.get_credential(&key).map_err(|err| ApiError::new(from_store_error(err)))?;

    if credential.is_none() && strict && requires_credential(tool) {
        return Err(ApiError::new(GatewayError::CredentialNotFound { credential_id, tenant_id: tenant_id.to_string() }));
    }
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_id_wins_over_convention() {
        assert_eq!(credential_id_for(Tool::GitHub, Some("my-id"), "clawdbot-default"), "my-id");
    }

    #[test]
    fn clawdbot_falls_back_to_configured_default() {
        assert_eq!(credential_id_for(Tool::Clawdbot, None, "clawdbot-default"), "clawdbot-default");
    }

    #[test]
    fn other_tools_fall_back_to_tool_name_convention() {
        assert_eq!(credential_id_for(Tool::GitHub, None, "clawdbot-default"), "github");
    }

    #[test]
    fn sandboxed_tools_do_not_require_a_credential() {
        assert!(!requires_credential(Tool::Email));
        assert!(!requires_credential(Tool::File));
        assert!(!requires_credential(Tool::Calendar));
        assert!(!requires_credential(Tool::Memory));
        assert!(requires_credential(Tool::GitHub));
        assert!(requires_credential(Tool::Clawdbot));
    }
}
