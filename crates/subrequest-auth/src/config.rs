//! Service configuration.
//!
//! Configuration is loaded from environment variables. Exactly one key
//! source (a local PEM file or a JWKS URL) must be configured; starting
//! without one would silently disable signature verification, so that case
//! is a fatal startup error.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default bind port when neither `BIND_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8080;

/// Default JWKS background refresh interval (hourly).
pub const DEFAULT_JWKS_REFRESH: Duration = Duration::from_secs(3600);

/// Service configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to a PEM-encoded EC public key file (static key mode).
    /// Takes priority over `jwks_url` when both are set.
    pub jwks_path: Option<String>,

    /// URL serving a JSON Web Key Set (remote key mode).
    pub jwks_url: Option<String>,

    /// Background refresh interval for the remote key set.
    pub jwks_refresh: Duration,

    /// Disable TLS certificate verification on the JWKS fetch transport.
    pub insecure_skip_verify: bool,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Statically configured response-header -> claim-name mapping,
    /// merged under per-request `headers_*` parameters.
    pub static_headers: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no JWKS_PATH or JWKS_URL configured; refusing to start without a key source")]
    MissingKeySource,

    #[error("invalid JWKS refresh interval: {0}")]
    InvalidRefreshInterval(String),

    #[error("invalid PORT: {0}")]
    InvalidPort(String),

    #[error("couldn't read public key file {path}: {reason}")]
    UnreadableKeyFile { path: String, reason: String },

    #[error("invalid public key file {path}: {reason}")]
    InvalidKeyFile { path: String, reason: String },

    #[error("initial JWKS fetch from {url} failed: {reason}")]
    JwksFetch { url: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwks_path = vars.get("JWKS_PATH").filter(|v| !v.is_empty()).cloned();
        let jwks_url = vars.get("JWKS_URL").filter(|v| !v.is_empty()).cloned();

        if jwks_path.is_none() && jwks_url.is_none() {
            return Err(ConfigError::MissingKeySource);
        }

        let jwks_refresh = if let Some(value_str) = vars.get("JWKS_REFRESH_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidRefreshInterval(format!(
                    "JWKS_REFRESH_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidRefreshInterval(
                    "JWKS_REFRESH_SECONDS must be greater than 0".to_string(),
                ));
            }

            Duration::from_secs(value)
        } else {
            DEFAULT_JWKS_REFRESH
        };

        let insecure_skip_verify = vars
            .get("INSECURE_SKIP_VERIFY")
            .map(|v| v == "true")
            .unwrap_or(false);

        let bind_address = if let Some(addr) = vars.get("BIND_ADDRESS") {
            addr.clone()
        } else {
            let port: u16 = match vars.get("PORT") {
                Some(value_str) => value_str.parse().map_err(|e| {
                    ConfigError::InvalidPort(format!(
                        "PORT must be a valid port number, got '{}': {}",
                        value_str, e
                    ))
                })?,
                None => DEFAULT_PORT,
            };
            format!("0.0.0.0:{}", port)
        };

        // HEADERS_<Name>=<claim> entries form the static projection table
        let static_headers = vars
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix("HEADERS_")
                    .filter(|name| !name.is_empty() && !value.is_empty())
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect();

        Ok(Config {
            jwks_path,
            jwks_url,
            jwks_refresh,
            insecure_skip_verify,
            bind_address,
            static_headers,
        })
    }
}
