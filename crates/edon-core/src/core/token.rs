// crates/edon-core/src/core/token.rs
// ============================================================================
// Module: Token Hashing
// Description: The single hash function used to turn a raw bearer token
// into the form the store persists and compares against.
// Purpose: Guarantee raw API keys and channel tokens are never written to
// disk anywhere in the gateway; only their digest is.
// Dependencies: sha2
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

/// Returns the hex-encoded SHA-256 digest of `raw`.
///
/// Every authentication lookup (API key, channel token) compares this
/// digest, never the raw token, against stored rows.
#[must_use]
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_hashes_the_same() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
    }

    #[test]
    fn different_input_hashes_differently() {
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
