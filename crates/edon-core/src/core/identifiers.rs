// crates/edon-core/src/core/identifiers.rs
// ============================================================================
// Module: Gateway Identifiers
// Description: Canonical opaque identifiers used throughout the gateway.
// Purpose: Provide strongly typed, serializable identifiers with stable
// wire forms so tenant/action/decision identity can never be confused at
// a type level.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers are opaque newtypes over either a UUID (for objects the
//! gateway itself mints: actions, intents, tenants) or an operator-chosen
//! string (for credentials, agents, API keys) that external systems also
//! need to reference. All identifiers serialize as plain strings on the
//! wire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: UUID-backed identifiers
// ============================================================================

macro_rules! uuid_identifier {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID value.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn get(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_identifier!(TenantId, "Tenant identifier scoped to gateway credentials and intents.");
uuid_identifier!(UserId, "User identifier; a user owns exactly one tenant.");
uuid_identifier!(IntentId, "Intent contract identifier.");
uuid_identifier!(ActionId, "Proposed-action identifier.");

// ============================================================================
// SECTION: String-backed identifiers
// ============================================================================

macro_rules! string_identifier {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a caller-provided string as an identifier.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

string_identifier!(AgentId, "Caller-supplied agent identifier (header or query param).");
string_identifier!(CredentialId, "Operator-chosen credential identifier, unique per tenant.");
string_identifier!(ApiKeyId, "API key identifier (the hash, never the raw key, is stored).");
string_identifier!(ChannelTokenId, "Channel token identifier (e.g. a messenger binding).");
string_identifier!(ConnectCodeId, "Single-use connect-code identifier.");

/// Decision identifier, deterministically derived from an action id and a
/// timestamp: `dec-<action_id>-<timestamp>`.
///
/// # Invariants
/// - Always derivable from `(action_id, timestamp)`; never independently
///   chosen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(String);

impl DecisionId {
    /// Builds the deterministic decision id for an action evaluated at `at`.
    #[must_use]
    pub fn derive(action_id: ActionId, at: &crate::core::time::Timestamp) -> Self {
        Self(format!("dec-{action_id}-{}", at.to_rfc3339()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::Timestamp;

    #[test]
    fn decision_id_is_deterministic() {
        let action_id = ActionId::new();
        let at = Timestamp::from_rfc3339("2026-01-01T00:00:00Z").unwrap();
        let a = DecisionId::derive(action_id, &at);
        let b = DecisionId::derive(action_id, &at);
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("dec-"));
    }

    #[test]
    fn tenant_id_round_trips_through_string() {
        let id = TenantId::new();
        let printed = id.to_string();
        let parsed: TenantId = printed.parse().unwrap();
        assert_eq!(id, parsed);
    }
}
