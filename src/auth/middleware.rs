// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate middleware.
//!
//! Applied to protected routes with
//! `axum::middleware::from_fn_with_state(state, require_auth)`. On success the
//! verified [`AuthenticatedResearcher`] is inserted into request extensions,
//! where the [`super::Auth`] extractor picks it up.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, AuthenticatedResearcher};
use crate::state::AppState;

/// Pull the bearer token out of the `Authorization` header.
///
/// A missing header, a non-`Bearer` scheme or an empty token all count as
/// "no token".
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MissingToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Verify the bearer token and resolve the researcher it identifies.
pub(crate) fn authenticate(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<AuthenticatedResearcher, AuthError> {
    let token = bearer_token(headers)?;
    let claims = state.tokens.verify(token)?;
    Ok(AuthenticatedResearcher::from_claims(claims))
}

/// Authorization gate middleware function.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state) {
        Ok(researcher) => {
            tracing::debug!(researcher_id = %researcher.researcher_id, "Authenticated request");
            request.extensions_mut().insert(researcher);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_unusable_header_is_missing_token() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer    ", "abc.def.ghi"] {
            assert!(
                matches!(bearer_token(&headers_with(value)), Err(AuthError::MissingToken)),
                "{value}"
            );
        }
    }
}
