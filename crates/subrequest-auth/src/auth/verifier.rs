//! Token verification.
//!
//! Parses the compact serialization, resolves the verification key from the
//! key resolver, verifies the signature, and extracts the claim set. Any
//! parse failure, signature mismatch, or structural-claim failure yields an
//! error; no partial claim set is ever returned.

use crate::auth::claims::ClaimSet;
use crate::auth::keys::KeyResolver;
use crate::errors::AuthError;
use jsonwebtoken::{decode, decode_header, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Maximum allowed token size in bytes (8 KiB).
///
/// Oversized tokens are rejected before any base64 decoding or
/// cryptographic work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Verifies compact-serialized signed tokens against the key resolver.
pub struct TokenVerifier {
    resolver: KeyResolver,
}

impl TokenVerifier {
    pub fn new(resolver: KeyResolver) -> Self {
        Self { resolver }
    }

    /// Verify a token and return its claim set.
    ///
    /// Structural claims are validated per standard token semantics when
    /// present: an expired `exp` or a not-yet-valid `nbf` rejects the
    /// token, but neither claim is required. The audience claim is not
    /// checked; claim requirements belong to the per-request policy.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "sra.auth.verifier",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(AuthError::InvalidToken("token too large".to_string()));
        }

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(target: "sra.auth.verifier", error = %e, "Failed to parse token header");
            AuthError::InvalidToken(format!("malformed token header: {e}"))
        })?;

        let resolved = self.resolver.resolve(&header)?;

        let mut validation = Validation::new(resolved.algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        // exp/nbf are validated when present but not required
        validation.required_spec_claims = HashSet::new();

        let token_data =
            decode::<Map<String, Value>>(token, &resolved.key, &validation).map_err(|e| {
                tracing::debug!(target: "sra.auth.verifier", error = %e, "Token verification failed");
                AuthError::InvalidToken(format!("verification failed: {e}"))
            })?;

        Ok(ClaimSet::new(token_data.claims))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::jwks::JwksClient;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use std::sync::Arc;

    fn empty_remote_verifier() -> TokenVerifier {
        let client = Arc::new(JwksClient::new("http://unused.invalid".to_string(), false));
        TokenVerifier::new(KeyResolver::Remote { client })
    }

    #[test]
    fn test_oversized_token_rejected_before_parsing() {
        let verifier = empty_remote_verifier();
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);

        let result = verifier.verify(&oversized);
        assert!(
            matches!(result, Err(AuthError::InvalidToken(msg)) if msg.contains("too large"))
        );
    }

    #[test]
    fn test_malformed_token_rejected() {
        let verifier = empty_remote_verifier();

        for token in ["", "only-one-part", "two.parts", "!!!.bad.base64"] {
            let result = verifier.verify(token);
            assert!(
                matches!(result, Err(AuthError::InvalidToken(_))),
                "token {:?} should be rejected as malformed",
                token
            );
        }
    }

    #[test]
    fn test_well_formed_token_with_unknown_key_rejected() {
        let verifier = empty_remote_verifier();

        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256","typ":"JWT","kid":"unknown"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"u1"}"#);
        let token = format!("{header}.{payload}.c2lnbmF0dXJl");

        let result = verifier.verify(&token);
        assert!(matches!(result, Err(AuthError::KeyResolution(_))));
    }

    #[test]
    fn test_alg_none_rejected() {
        let verifier = empty_remote_verifier();

        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"attacker"}"#);
        let token = format!("{header}.{payload}.");

        // jsonwebtoken has no "none" algorithm; header parsing fails
        let result = verifier.verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
