// crates/edon-core/src/core/tenant.rs
// ============================================================================
// Module: Tenants and Users
// Description: The tenant/user identity records every credential, intent
// and decision is scoped under.
// Purpose: Give the store and pipeline one shared shape for "whose
// request is this."
// Dependencies: serde, crate::core::identifiers
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

/// Whether a tenant may authenticate. Billing/plan bookkeeping itself is
/// out of scope; this is the minimal flag authentication checks before
/// letting a request through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// The tenant may authenticate and act normally.
    Active,
    /// The tenant is suspended; authentication fails with 402.
    Inactive,
}

impl TenantStatus {
    /// Parses the store's persisted representation.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "inactive" { Self::Inactive } else { Self::Active }
    }

    /// Returns the store's persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// A tenant: the scoping boundary for credentials, intents and decisions.
///
/// # Invariants
/// - No query anywhere in the gateway may read or write rows belonging to
///   a tenant other than the one on the authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant identifier.
    pub id: TenantId,
    /// Human-readable display name.
    pub display_name: String,
    /// Whether the tenant may currently authenticate.
    pub status: TenantStatus,
    /// When the tenant was created.
    pub created_at: Timestamp,
}

/// A user; owns exactly one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Tenant this user belongs to.
    pub tenant_id: TenantId,
    /// Login/display email.
    pub email: String,
    /// When the user was created.
    pub created_at: Timestamp,
}

/// An API key, stored only as its SHA-256 hash; the raw token is never
/// persisted anywhere in the gateway.
///
/// # Invariants
/// - `token_hash` is the hex-encoded SHA-256 digest of the raw token, never
///   the token itself.
/// - A revoked key (`active == false`) is excluded from every
///   authentication lookup, not merely hidden from listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Key identifier (opaque, operator-chosen label).
    pub id: crate::core::identifiers::ApiKeyId,
    /// Tenant this key authenticates as.
    pub tenant_id: TenantId,
    /// Hex-encoded SHA-256 digest of the raw token.
    pub token_hash: String,
    /// When the key was created.
    pub created_at: Timestamp,
    /// Whether the key is still usable for authentication.
    pub active: bool,
}

/// A channel token binds an external identity (e.g. a messenger user id)
/// to a tenant, authenticated the same way an API key is: by hash lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelTokenRecord {
    /// Token identifier.
    pub id: crate::core::identifiers::ChannelTokenId,
    /// Tenant this token authenticates as.
    pub tenant_id: TenantId,
    /// Hex-encoded SHA-256 digest of the raw token.
    pub token_hash: String,
    /// When the token was created.
    pub created_at: Timestamp,
    /// Whether the token is still usable for authentication.
    pub active: bool,
}
