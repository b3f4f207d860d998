// crates/edon-server/src/request.rs
// ============================================================================
// Module: Request Extraction
// Description: Builds a transport-agnostic `edon_pipeline::IncomingRequest`
// from the `axum` request parts a handler actually receives.
// Purpose: Keep the header-name-to-field mapping in one place instead of
// repeating it in every handler.
// Dependencies: axum, edon-pipeline
// ============================================================================

//! ## Overview
//! Every handler that runs the pipeline calls [`build_incoming_request`]
//! once, right after its own `axum` extractors have pulled the header map,
//! path, and (if applicable) parsed JSON body out of the request. Nothing
//! here reads the body itself; callers pass whatever JSON they already
//! extracted so a handler that doesn't need a body isn't forced to buffer
//! one just to satisfy this function.

use axum::http::HeaderMap;
use edon_pipeline::IncomingRequest;
use serde_json::Value;

const HEADER_EDON_TOKEN: &str = "x-edon-token";
const HEADER_AGENT_ID: &str = "x-agent-id";
const HEADER_INTENT_ID: &str = "x-intent-id";
const HEADER_DECISION_ID: &str = "x-decision-id";
const HEADER_TENANT_ID: &str = "x-tenant-id";

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(ToString::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    header_string(headers, "authorization")?.strip_prefix("Bearer ").map(ToString::to_string)
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    header_string(headers, "content-length")?.parse().ok()
}

/// Builds an [`IncomingRequest`] from the request's headers and path, with
/// an optional inline decision bundle pulled from an already-parsed body.
#[must_use]
pub fn build_incoming_request(headers: &HeaderMap, path: &str, decision_bundle: Option<Value>) -> IncomingRequest {
    IncomingRequest {
        path: path.to_string(),
        edon_token: header_string(headers, HEADER_EDON_TOKEN),
        bearer_token: bearer_token(headers),
        agent_id: header_string(headers, HEADER_AGENT_ID),
        intent_id: header_string(headers, HEADER_INTENT_ID),
        decision_id: header_string(headers, HEADER_DECISION_ID),
        dev_tenant_id: header_string(headers, HEADER_TENANT_ID),
        content_length: content_length(headers),
        decision_bundle,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn extracts_edon_token_over_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-edon-token", HeaderValue::from_static("edon-secret"));
        headers.insert("authorization", HeaderValue::from_static("Bearer bearer-secret"));
        let request = build_incoming_request(&headers, "/execute", None);
        assert_eq!(request.supplied_token(), Some("edon-secret"));
    }

    #[test]
    fn falls_back_to_bearer_token_when_no_edon_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer bearer-secret"));
        let request = build_incoming_request(&headers, "/execute", None);
        assert_eq!(request.supplied_token(), Some("bearer-secret"));
    }
}
