// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated researchers.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(researcher): Auth) -> impl IntoResponse {
//!     // researcher is AuthenticatedResearcher
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::authenticate;
use super::{AuthError, AuthenticatedResearcher};
use crate::state::AppState;

/// Extractor for the researcher identified by the request's bearer token.
///
/// Behind [`super::middleware::require_auth`] this reads the identity the
/// gate already verified. Used on its own it verifies the header itself,
/// with the same rejections.
pub struct Auth(pub AuthenticatedResearcher);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the researcher
        if let Some(researcher) = parts.extensions.get::<AuthenticatedResearcher>().cloned() {
            return Ok(Auth(researcher));
        }

        authenticate(&parts.headers, state).map(Auth)
    }
}
