//! Remote JWKS client with periodic background refresh.
//!
//! The key set is fetched once at startup and then re-fetched on a fixed
//! interval by a background task. Each successful refresh builds a complete
//! new snapshot and swaps it in wholesale, so request-path readers observe
//! either the old or the new set, never a partial one, and never wait on an
//! in-flight refresh. A refresh failure is logged and the previous snapshot
//! stays in service (stale-but-available).

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Timeout for a single JWKS fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON Web Key from a JWKS document.
///
/// Only the fields needed for EC and RSA verification keys are modeled;
/// unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("EC" or "RSA").
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Algorithm (e.g. "ES256", "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Curve name for EC keys (e.g. "P-256").
    #[serde(default)]
    pub crv: Option<String>,

    /// EC x coordinate (base64url encoded).
    #[serde(default)]
    pub x: Option<String>,

    /// EC y coordinate (base64url encoded).
    #[serde(default)]
    pub y: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,
}

/// JWKS response document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

/// Immutable snapshot of a fetched key set.
#[derive(Debug, Default)]
pub struct KeySet {
    keys: Vec<Jwk>,
    by_kid: HashMap<String, usize>,
}

impl KeySet {
    fn from_keys(keys: Vec<Jwk>) -> Self {
        let by_kid = keys
            .iter()
            .enumerate()
            .filter_map(|(i, key)| key.kid.clone().map(|kid| (kid, i)))
            .collect();

        Self { keys, by_kid }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Select the key for a token.
    ///
    /// With a `kid` the lookup is exact. Without one, a single-key set
    /// resolves to that key; anything else is ambiguous and resolves to
    /// nothing.
    pub fn find(&self, kid: Option<&str>) -> Option<&Jwk> {
        match kid {
            Some(kid) => self.by_kid.get(kid).and_then(|&i| self.keys.get(i)),
            None => {
                if self.keys.len() == 1 {
                    self.keys.first()
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("invalid JWKS document: {0}")]
    Parse(String),
}

/// Client owning the remote key-set snapshot.
pub struct JwksClient {
    jwks_url: String,
    http_client: reqwest::Client,
    snapshot: RwLock<Arc<KeySet>>,
}

impl JwksClient {
    /// Create a client; no fetch happens until [`refresh`](Self::refresh).
    ///
    /// `insecure_skip_verify` disables TLS certificate verification on the
    /// fetch transport only.
    pub fn new(jwks_url: String, insecure_skip_verify: bool) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    target: "sra.auth.jwks",
                    error = %e,
                    "Failed to build HTTP client with custom config, using defaults"
                );
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            snapshot: RwLock::new(Arc::new(KeySet::default())),
        }
    }

    /// Current key-set snapshot. Never blocks on a refresh in flight.
    pub fn current(&self) -> Arc<KeySet> {
        Arc::clone(
            &self
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Fetch the JWKS and swap in a new snapshot.
    ///
    /// On failure the previous snapshot is left untouched.
    #[instrument(skip(self), fields(url = %self.jwks_url))]
    pub async fn refresh(&self) -> Result<usize, JwksError> {
        tracing::debug!(target: "sra.auth.jwks", "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| JwksError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(JwksError::Status(response.status().as_u16()));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| JwksError::Parse(e.to_string()))?;

        let key_set = KeySet::from_keys(jwks.keys);
        let key_count = key_set.len();

        tracing::info!(
            target: "sra.auth.jwks",
            key_count,
            "JWKS snapshot refreshed"
        );

        // Whole-snapshot swap; the write lock is held only for the store
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *snapshot = Arc::new(key_set);

        Ok(key_count)
    }

    /// Spawn the periodic refresh task.
    ///
    /// The first tick fires after one full interval; the startup fetch is
    /// done separately so a broken endpoint fails the process fast. Refresh
    /// errors are logged and the stale snapshot stays in service.
    pub fn spawn_refresh_task(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let client = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick duplicates the startup fetch
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match client.refresh().await {
                    Ok(key_count) => {
                        tracing::debug!(
                            target: "sra.auth.jwks",
                            key_count,
                            "Periodic JWKS refresh complete"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            target: "sra.auth.jwks",
                            error = %e,
                            "JWKS refresh failed, keeping previous key set"
                        );
                    }
                }
            }
        })
    }
}
