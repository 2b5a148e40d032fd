//! Response header projection.
//!
//! Validated claims can be surfaced to the reverse proxy as response
//! headers. The mapping comes from `headers_<OutHeader>=<claimName>` query
//! parameters merged over the statically configured table. String claims
//! are base64-encoded directly; any other claim shape is serialized to
//! compact JSON first, so an array claim becomes base64 of its JSON form.

use crate::auth::claims::ClaimSet;
use axum::http::{HeaderName, HeaderValue};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use std::collections::HashMap;

const HEADER_PREFIX: &str = "headers_";

/// Header-name -> claim-name mapping for one request.
#[derive(Debug, Default)]
pub struct HeaderProjection {
    mappings: HashMap<String, String>,
}

impl HeaderProjection {
    /// Build the projection from query parameters, overlaid on the static
    /// configuration table. For a repeated `headers_` parameter the first
    /// value wins; request parameters override static entries.
    pub fn from_query(
        params: &[(String, String)],
        static_headers: &HashMap<String, String>,
    ) -> Self {
        let mut requested: HashMap<String, String> = HashMap::new();

        for (key, value) in params {
            if let Some(header) = key.strip_prefix(HEADER_PREFIX) {
                if header.is_empty() || value.is_empty() {
                    continue;
                }
                requested
                    .entry(header.to_string())
                    .or_insert_with(|| value.clone());
            }
        }

        let mut mappings = static_headers.clone();
        mappings.extend(requested);

        Self { mappings }
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Produce the encoded response headers for `claims`.
    ///
    /// Absent claims are skipped. A claim value that fails serialization or
    /// a mapping with an invalid header name skips that single header, never
    /// the request.
    pub fn project(&self, claims: &ClaimSet) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = Vec::with_capacity(self.mappings.len());

        for (header, claim_name) in &self.mappings {
            let Some(value) = claims.value(claim_name) else {
                continue;
            };

            let Some(encoded) = encode_claim(value) else {
                tracing::warn!(
                    target: "sra.headers",
                    claim = %claim_name,
                    "Couldn't serialize claim value, skipping header"
                );
                continue;
            };

            let Ok(name) = HeaderName::try_from(header.as_str()) else {
                tracing::warn!(
                    target: "sra.headers",
                    header = %header,
                    "Invalid response header name, skipping"
                );
                continue;
            };
            let Ok(value) = HeaderValue::from_str(&encoded) else {
                continue;
            };

            headers.push((name, value));
        }

        headers
    }
}

/// Base64 encoding of a claim value: raw bytes for strings, compact JSON
/// for everything else.
fn encode_claim(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(STANDARD.encode(s.as_bytes())),
        other => serde_json::to_string(other)
            .ok()
            .map(|json| STANDARD.encode(json.as_bytes())),
    }
}
