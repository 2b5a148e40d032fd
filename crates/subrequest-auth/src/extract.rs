//! Credential extraction.
//!
//! The credential is either the value of a cookie named by the request's
//! `cookie` query parameter, or the token from a standard bearer-scheme
//! Authorization header. Extraction failure always yields deny.

use crate::errors::AuthError;
use axum::http::{header, HeaderMap};

/// Locate the raw token string in the request.
///
/// When `cookie_name` is given the named cookie is the only accepted
/// source; its absence is an extraction failure rather than a fallback to
/// the Authorization header.
pub fn extract_credential(
    headers: &HeaderMap,
    cookie_name: Option<&str>,
) -> Result<String, AuthError> {
    match cookie_name {
        Some(name) => extract_from_cookie(headers, name),
        None => extract_from_authorization(headers),
    }
}

fn extract_from_cookie(headers: &HeaderMap, name: &str) -> Result<String, AuthError> {
    for header_value in headers.get_all(header::COOKIE) {
        let Ok(cookies) = header_value.to_str() else {
            continue;
        };

        for cookie in cookies.split(';') {
            if let Some((cookie_name, value)) = cookie.trim().split_once('=') {
                if cookie_name == name && !value.is_empty() {
                    return Ok(value.to_string());
                }
            }
        }
    }

    Err(AuthError::Extraction(format!("cookie {name} not present")))
}

fn extract_from_authorization(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AuthError::Extraction("missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AuthError::Extraction("Authorization header is not bearer scheme".to_string())
        })?;

    Ok(token.to_string())
}
