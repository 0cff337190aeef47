// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    extract::Request,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_auth,
    config::{ServerConfig, DEFAULT_CORS_ALLOWED_ORIGIN, DEFAULT_REQUEST_TIMEOUT_SECS},
    error::{panic_response, ApiError, ErrorBody},
    models::{
        CreatePostRequest, CreatePostResponse, InteractRequest, LoggedInResearcher, LoginRequest,
        LoginResponse, MessageResponse, PostAuthor, ProfileResponse, ResearchPost,
        ResearcherSummary, SignupRequest, SignupResponse,
    },
    state::AppState,
    storage::{PostCategory, ResearcherId, ResearcherStats},
};

pub mod auth;
pub mod health;
pub mod posts;

/// HTTP-level settings applied around the routes.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub cors_allowed_origin: String,
    pub request_timeout: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cors_allowed_origin: DEFAULT_CORS_ALLOWED_ORIGIN.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<&ServerConfig> for RouterOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            cors_allowed_origin: config.cors_allowed_origin.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

pub fn router(state: AppState, options: &RouterOptions) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/health", get(health::health));

    let protected_routes = Router::new()
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/auth/stats", get(auth::stats))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route("/api/posts/{post_id}/interact", patch(posts::interact))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(allowed_origin(&options.cors_allowed_origin))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors)
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    options.request_timeout,
                )),
        )
}

fn allowed_origin(origin: &str) -> AllowOrigin {
    match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(origin, "Ignoring unparsable CORS origin");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup,
        auth::login,
        auth::profile,
        auth::stats,
        posts::create_post,
        posts::list_posts,
        posts::interact,
        health::health
    ),
    components(
        schemas(
            ErrorBody,
            SignupRequest,
            SignupResponse,
            LoginRequest,
            LoginResponse,
            LoggedInResearcher,
            ResearcherSummary,
            ResearcherId,
            ProfileResponse,
            ResearcherStats,
            MessageResponse,
            CreatePostRequest,
            CreatePostResponse,
            InteractRequest,
            ResearchPost,
            PostAuthor,
            PostCategory,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Researcher accounts and sessions"),
        (name = "Posts", description = "Research community posts"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;
