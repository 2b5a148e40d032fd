//! Subrequest auth error types.
//!
//! All per-request errors map to bare HTTP status codes via the
//! `IntoResponse` impl. The reverse proxy consuming this service only ever
//! sees a status code; diagnostic detail is logged server-side and never
//! leaks into the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Per-request validation error.
///
/// Maps to HTTP status codes:
/// - Extraction, KeyResolution, InvalidToken, PolicyMismatch: 401 Unauthorized
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential could not be located in the request.
    #[error("credential extraction failed: {0}")]
    Extraction(String),

    /// No verification key matched the token.
    #[error("key resolution failed: {0}")]
    KeyResolution(String),

    /// Token failed to parse, verify, or carry well-formed claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token verified but its claims did not satisfy the request policy.
    #[error("token claims did not satisfy policy")]
    PolicyMismatch,

    /// Unexpected internal failure.
    #[error("internal server error")]
    Internal,
}

impl AuthError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Extraction(_)
            | AuthError::KeyResolution(_)
            | AuthError::InvalidToken(_)
            | AuthError::PolicyMismatch => 401,
            AuthError::Internal => 500,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Extraction(reason) => {
                tracing::debug!(target: "sra.request", reason = %reason, "Credential extraction failed");
                StatusCode::UNAUTHORIZED
            }
            AuthError::KeyResolution(reason) => {
                tracing::debug!(target: "sra.request", reason = %reason, "Key resolution failed");
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidToken(reason) => {
                tracing::debug!(target: "sra.request", reason = %reason, "Token rejected");
                StatusCode::UNAUTHORIZED
            }
            AuthError::PolicyMismatch => {
                tracing::debug!(target: "sra.request", "Claims did not satisfy policy");
                StatusCode::UNAUTHORIZED
            }
            AuthError::Internal => {
                tracing::error!(target: "sra.request", "Unexpected internal failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut response = status.into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer error=\"invalid_token\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
