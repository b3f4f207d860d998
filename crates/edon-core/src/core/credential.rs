// crates/edon-core/src/core/credential.rs
// ============================================================================
// Module: Credentials
// Description: The tenant-scoped secret record connectors draw on to
// act on a tenant's behalf.
// Purpose: Keep credential identity composite on (credential_id,
// tenant_id) at the type level, so a lookup can never silently fall
// back across tenants.
// Dependencies: serde, serde_json, crate::core::identifiers
// ============================================================================

//! ## Overview
//! A [`Credential`] is always addressed by the pair `(credential_id,
//! tenant_id)`, never by `credential_id` alone — the store's lookup
//! query enforces this, and [`CredentialKey`] exists so every call site
//! has to supply both halves before it can even construct a query. Raw
//! `credential_data` is write-only from the HTTP surface: no handler in
//! the gateway ever serializes a `Credential` with its data back to a
//! caller, only [`CredentialSummary`].

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::CredentialId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

/// The composite key every credential lookup must supply.
///
/// # Invariants
/// - There is no lookup path that accepts `credential_id` without a
///   `tenant_id` slot alongside it (even when that slot is `None`);
///   cross-tenant fallback — one tenant's call silently resolving
///   another tenant's row — is structurally impossible through this
///   type. `tenant_id: None` addresses the global/service-wide
///   credential namespace, not "any tenant."
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    /// Credential identifier, unique only within `tenant_id`.
    pub credential_id: CredentialId,
    /// Owning tenant, or `None` for a global/service-wide credential not
    /// scoped to any one tenant.
    pub tenant_id: Option<TenantId>,
}

impl CredentialKey {
    /// Builds a composite credential key.
    #[must_use]
    pub fn new(credential_id: CredentialId, tenant_id: Option<TenantId>) -> Self {
        Self { credential_id, tenant_id }
    }
}

/// A stored credential, including its secret payload.
///
/// # Invariants
/// - Never serialized back to an HTTP caller; use [`CredentialSummary`]
///   for anything response-shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Composite identity: `(credential_id, tenant_id)`.
    pub key: CredentialKey,
    /// The tool this credential authenticates against.
    pub tool: String,
    /// Opaque secret payload (API keys, OAuth tokens, etc.).
    pub data: Value,
    /// When this credential row was last written. Duplicate `(credential_id,
    /// tenant_id)` writes replace the row; the most recently written row
    /// always wins on lookup.
    pub updated_at: Timestamp,
}

/// Caller-facing view of a credential with `data` omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSummary {
    /// Credential identifier.
    pub credential_id: CredentialId,
    /// The tool this credential authenticates against.
    pub tool: String,
    /// When this credential row was last written.
    pub updated_at: Timestamp,
}

impl From<&Credential> for CredentialSummary {
    fn from(credential: &Credential) -> Self {
        Self {
            credential_id: credential.key.credential_id.clone(),
            tool: credential.tool.clone(),
            updated_at: credential.updated_at,
        }
    }
}

impl serde::Serialize for CredentialKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("CredentialKey", 2)?;
        state.serialize_field("credential_id", &self.credential_id)?;
        state.serialize_field("tenant_id", &self.tenant_id)?;
        state.end()
    }
}

impl<'de> serde::Deserialize<'de> for CredentialKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            credential_id: CredentialId,
            #[serde(default)]
            tenant_id: Option<TenantId>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self { credential_id: raw.credential_id, tenant_id: raw.tenant_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_never_carries_secret_data() {
        let credential = Credential {
            key: CredentialKey::new(CredentialId::new("gmail-main"), Some(TenantId::new())),
            tool: "gmail".to_string(),
            data: json!({"access_token": "super-secret"}),
            updated_at: Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap(),
        };
        let summary = CredentialSummary::from(&credential);
        let serialized = serde_json::to_string(&summary).unwrap();
        assert!(!serialized.contains("super-secret"));
    }

    #[test]
    fn global_credential_key_has_no_tenant() {
        let key = CredentialKey::new(CredentialId::new("shared-search-key"), None);
        assert_eq!(key.tenant_id, None);
    }
}
