//! Token authentication: key resolution and signature verification.

pub mod claims;
pub mod jwks;
pub mod keys;
pub mod verifier;

pub use claims::{ClaimSet, ClaimValue};
pub use keys::KeyResolver;
pub use verifier::TokenVerifier;
