//! Verification key resolution.
//!
//! Two construction modes, selected at startup and fixed for the process
//! lifetime: a single static EC public key loaded from a PEM file, or a
//! remote JWKS refreshed in the background. Static mode resolves to the one
//! key regardless of token contents; remote mode selects by the token's
//! `kid` header.

use crate::auth::jwks::{Jwk, JwksClient};
use crate::config::{Config, ConfigError};
use crate::errors::AuthError;
use jsonwebtoken::{Algorithm, DecodingKey, Header};
use std::sync::Arc;
use std::time::Duration;

/// Algorithms verifiable with an EC public key.
const EC_ALGORITHMS: &[Algorithm] = &[Algorithm::ES256, Algorithm::ES384];

/// Algorithms verifiable with an RSA public key.
const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// A verification key together with the algorithm to verify with.
pub struct ResolvedKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

/// Key source for token verification.
pub enum KeyResolver {
    /// Single EC public key loaded from a PEM file at startup.
    Static { key: DecodingKey },

    /// Remote JWKS with periodic background refresh.
    Remote { client: Arc<JwksClient> },
}

impl KeyResolver {
    /// Build the resolver from configuration.
    ///
    /// The key file takes priority when both sources are configured. Both
    /// an unusable key file and a failed initial JWKS fetch are fatal: the
    /// service must not start without a working key source.
    pub async fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if let Some(path) = &config.jwks_path {
            let pem = std::fs::read(path).map_err(|e| ConfigError::UnreadableKeyFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;

            let key = DecodingKey::from_ec_pem(&pem).map_err(|e| ConfigError::InvalidKeyFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;

            tracing::info!(target: "sra.auth.keys", path = %path, "Loaded static EC public key");
            Ok(KeyResolver::Static { key })
        } else if let Some(url) = &config.jwks_url {
            let client = Arc::new(JwksClient::new(url.clone(), config.insecure_skip_verify));

            let key_count =
                client
                    .refresh()
                    .await
                    .map_err(|e| ConfigError::JwksFetch {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;

            tracing::info!(target: "sra.auth.keys", url = %url, key_count, "Fetched initial JWKS");
            Ok(KeyResolver::Remote { client })
        } else {
            Err(ConfigError::MissingKeySource)
        }
    }

    /// Start the background refresh task in remote mode.
    pub fn spawn_refresh(&self, interval: Duration) -> Option<tokio::task::JoinHandle<()>> {
        match self {
            KeyResolver::Remote { client } => Some(client.spawn_refresh_task(interval)),
            KeyResolver::Static { .. } => None,
        }
    }

    /// Resolve the verification key for a token header.
    pub fn resolve(&self, header: &Header) -> Result<ResolvedKey, AuthError> {
        match self {
            KeyResolver::Static { key } => {
                if !EC_ALGORITHMS.contains(&header.alg) {
                    return Err(AuthError::KeyResolution(format!(
                        "static EC key cannot verify {:?} tokens",
                        header.alg
                    )));
                }

                Ok(ResolvedKey {
                    key: key.clone(),
                    algorithm: header.alg,
                })
            }
            KeyResolver::Remote { client } => {
                let snapshot = client.current();
                let jwk = snapshot.find(header.kid.as_deref()).ok_or_else(|| {
                    AuthError::KeyResolution(format!(
                        "no key matching kid {:?} in current key set",
                        header.kid
                    ))
                })?;

                decoding_key_for(jwk, header.alg)
            }
        }
    }
}

/// Build the decoding key for a JWK and check algorithm agreement with the
/// token header.
fn decoding_key_for(jwk: &Jwk, token_alg: Algorithm) -> Result<ResolvedKey, AuthError> {
    let (key, family) = match jwk.kty.as_str() {
        "EC" => {
            let x = jwk
                .x
                .as_deref()
                .ok_or_else(|| AuthError::KeyResolution("EC JWK missing x".to_string()))?;
            let y = jwk
                .y
                .as_deref()
                .ok_or_else(|| AuthError::KeyResolution("EC JWK missing y".to_string()))?;

            let key = DecodingKey::from_ec_components(x, y).map_err(|e| {
                AuthError::KeyResolution(format!("invalid EC key components: {e}"))
            })?;

            (key, EC_ALGORITHMS)
        }
        "RSA" => {
            let n = jwk
                .n
                .as_deref()
                .ok_or_else(|| AuthError::KeyResolution("RSA JWK missing n".to_string()))?;
            let e = jwk
                .e
                .as_deref()
                .ok_or_else(|| AuthError::KeyResolution("RSA JWK missing e".to_string()))?;

            let key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
                AuthError::KeyResolution(format!("invalid RSA key components: {e}"))
            })?;

            (key, RSA_ALGORITHMS)
        }
        other => {
            return Err(AuthError::KeyResolution(format!(
                "unsupported JWK key type {other}"
            )));
        }
    };

    if !family.contains(&token_alg) {
        return Err(AuthError::KeyResolution(format!(
            "token algorithm {:?} is not compatible with {} key",
            token_alg, jwk.kty
        )));
    }

    if let Some(alg_str) = &jwk.alg {
        let jwk_alg: Algorithm = alg_str.parse().map_err(|_| {
            AuthError::KeyResolution(format!("JWK declares unsupported algorithm {alg_str}"))
        })?;

        if jwk_alg != token_alg {
            return Err(AuthError::KeyResolution(format!(
                "token algorithm {:?} does not match key algorithm {alg_str}",
                token_alg
            )));
        }
    }

    Ok(ResolvedKey {
        key,
        algorithm: token_alg,
    })
}
