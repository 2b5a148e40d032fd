//! Subrequest Auth Service Library
//!
//! An HTTP authorization microservice consulted by a reverse proxy via
//! subrequest authentication (nginx `auth_request` style). Each request's
//! bearer credential is verified against a static EC public key or a
//! periodically refreshed remote JWKS, then checked against a per-request
//! claim policy supplied through query parameters.
//!
//! # Request pipeline
//!
//! ```text
//! extract.rs -> auth/verifier.rs (auth/keys.rs) -> policy.rs (pattern_cache.rs) -> headers.rs
//! ```
//!
//! # Modules
//!
//! - `config` - service configuration from environment
//! - `errors` - per-request error types with HTTP status mapping
//! - `auth` - key resolution, JWKS refresh, token verification, claims
//! - `policy` - per-request claim policy and evaluation
//! - `pattern_cache` - compiled-regex memoization
//! - `extract` - credential extraction (bearer header / named cookie)
//! - `headers` - response header projection
//! - `handlers` / `routes` / `middleware` - axum wiring
//! - `observability` - metric definitions and recorder setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod headers;
pub mod middleware;
pub mod observability;
pub mod pattern_cache;
pub mod policy;
pub mod routes;
