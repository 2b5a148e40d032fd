//! Subrequest validation handler.
//!
//! The full per-request pipeline: extract the credential, verify the token
//! signature and structural claims, evaluate the query-string claim policy,
//! and project claims into response headers. Every failure converts to a
//! bare 401 at this boundary; the reverse proxy sees only the status code.

use crate::errors::AuthError;
use crate::headers::HeaderProjection;
use crate::observability::metrics::record_token_validation;
use crate::policy::ClaimPolicy;
use crate::routes::AppState;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Handler for GET|HEAD /validate.
///
/// Query parameters:
/// - `cookie=<name>` - take the credential from the named cookie instead of
///   the Authorization header
/// - `claims_<name>=<value>` / `claims_regexp_<name>=<pattern>` - claim
///   policy, repeatable
/// - `headers_<header>=<claim>` - response header projection, repeatable
///
/// Returns 200 with projected headers on success, 401 on any extraction,
/// verification, or policy failure. Other methods are rejected with 405 by
/// the method router.
#[instrument(skip_all, name = "sra.validate")]
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    match run_validation(&state, &params, &headers) {
        Ok(projected) => {
            let mut response = StatusCode::OK.into_response();
            for (name, value) in projected {
                response.headers_mut().append(name, value);
            }
            response
        }
        Err(err) => err.into_response(),
    }
}

fn run_validation(
    state: &AppState,
    params: &[(String, String)],
    headers: &HeaderMap,
) -> Result<Vec<(HeaderName, HeaderValue)>, AuthError> {
    let cookie_name = params
        .iter()
        .find(|(key, _)| key == "cookie")
        .map(|(_, value)| value.as_str())
        .filter(|name| !name.is_empty());

    let token = crate::extract::extract_credential(headers, cookie_name)?;

    let started = Instant::now();
    let verified = state.verifier.verify(&token);
    record_token_validation(started.elapsed());
    let claims = verified?;

    let policy = ClaimPolicy::from_query(params);
    if !policy.evaluate(&claims, &state.patterns) {
        return Err(AuthError::PolicyMismatch);
    }

    let projection = HeaderProjection::from_query(params, &state.config.static_headers);
    Ok(projection.project(&claims))
}

#[cfg(test)]
mod tests {
    // The validation pipeline is covered end-to-end (server, JWKS origin,
    // signed tokens) by tests/validate_tests.rs; the pieces it composes
    // each carry their own unit tests.
}
