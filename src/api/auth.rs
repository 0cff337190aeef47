// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Researcher account endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};

use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{LoginRequest, LoginResponse, ProfileResponse, SignupRequest, SignupResponse},
    state::AppState,
    storage::ResearcherStats,
};

/// Peer address of the connection, when the server records it.
pub struct OriginIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for OriginIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OriginIp(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        ))
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Username already exists", body = ErrorBody),
        (status = 500, description = "Registration failed", body = ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .auth
        .signup(
            request.username.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| e.into_api_error("Registration failed. Please try again."))?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = ErrorBody),
        (status = 401, description = "Invalid username or password", body = ErrorBody),
        (status = 403, description = "Account is deactivated", body = ErrorBody),
        (status = 500, description = "Login failed", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    OriginIp(origin_ip): OriginIp,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .auth
        .login(
            request.username.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
            origin_ip,
        )
        .await
        .map_err(|e| e.into_api_error("Login failed. Please try again."))?;

    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current researcher profile", body = ProfileResponse),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody),
        (status = 404, description = "Researcher not found", body = ErrorBody)
    )
)]
pub async fn profile(
    Auth(researcher): Auth,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .auth
        .profile(researcher.researcher_id)
        .await
        .map_err(|e| e.into_api_error("Failed to fetch profile"))?;

    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/api/auth/stats",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Researcher statistics", body = ResearcherStats),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody)
    )
)]
pub async fn stats(
    Auth(_researcher): Auth,
    State(state): State<AppState>,
) -> Result<Json<ResearcherStats>, ApiError> {
    let stats = state
        .auth
        .stats()
        .await
        .map_err(|e| e.into_api_error("Failed to fetch statistics"))?;

    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedResearcher;

    #[tokio::test]
    async fn signup_handler_returns_created() {
        let state = AppState::for_tests();
        let request = SignupRequest {
            username: Some("researcher_01".to_string()),
            password: Some("secret1".to_string()),
        };

        let (status, Json(body)) = signup(State(state), Ok(Json(request))).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.message, "Researcher account created successfully");
        assert_eq!(body.researcher.username, "researcher_01");
        assert!(!body.token.is_empty());
    }

    #[tokio::test]
    async fn login_handler_missing_fields_is_bad_request() {
        let state = AppState::for_tests();
        let err = login(
            State(state),
            OriginIp(None),
            Ok(Json(LoginRequest::default())),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Username and password are required");
    }

    #[tokio::test]
    async fn profile_handler_reports_missing_researcher() {
        let state = AppState::for_tests();
        let ghost = AuthenticatedResearcher {
            researcher_id: crate::storage::ResearcherId(404),
            username: "ghost".to_string(),
            issued_at: 0,
            expires_at: 0,
        };

        let err = profile(Auth(ghost), State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Researcher not found");
    }
}
