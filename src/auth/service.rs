// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Auth Service
//!
//! Orchestrates signup, login and profile lookups on top of the store pool,
//! the password hasher and the token service.
//!
//! ## Login outcomes
//!
//! | Condition | Error | HTTP |
//! |-----------|-------|------|
//! | Missing username or password | `Validation` | 400 |
//! | Unknown username | `InvalidCredentials(UnknownUser)` | 401 |
//! | Wrong password | `InvalidCredentials(PasswordMismatch)` | 401 |
//! | Correct password, account deactivated | `AccountDeactivated` | 403 |
//!
//! Unknown usernames and wrong passwords produce the same client response.
//! The distinction only reaches the logs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::password::{PasswordError, PasswordHasher};
use super::token::{TokenError, TokenService};
use super::validation::{validate_login, validate_signup, ValidationError};
use crate::error::ApiError;
use crate::storage::{
    NewResearcher, ResearcherId, ResearcherStats, SessionRecord, StoreError, StorePool,
};

/// Why a login was refused with `InvalidCredentials`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    UnknownUser,
    PasswordMismatch,
}

impl LoginFailure {
    fn as_str(&self) -> &'static str {
        match self {
            LoginFailure::UnknownUser => "unknown_user",
            LoginFailure::PasswordMismatch => "password_mismatch",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("username already exists")]
    UsernameTaken,

    #[error("invalid credentials ({})", .0.as_str())]
    InvalidCredentials(LoginFailure),

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("researcher not found")]
    NotFound,

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthServiceError {
    /// Convert into a client-facing error.
    ///
    /// `failure_message` is used for infrastructure failures, which are
    /// logged here with full detail and never echoed to the client.
    pub fn into_api_error(self, failure_message: &'static str) -> ApiError {
        match self {
            AuthServiceError::Validation(err) => ApiError::bad_request(err.to_string()),
            AuthServiceError::UsernameTaken => ApiError::conflict("Username already exists"),
            AuthServiceError::InvalidCredentials(_) => {
                ApiError::unauthorized("Invalid username or password")
            }
            AuthServiceError::AccountDeactivated => ApiError::forbidden("Account is deactivated"),
            AuthServiceError::NotFound => ApiError::not_found("Researcher not found"),
            other @ (AuthServiceError::Hashing(_)
            | AuthServiceError::Token(_)
            | AuthServiceError::Store(_)) => {
                error!(error = %other, "{failure_message}");
                ApiError::internal(failure_message)
            }
        }
    }
}

/// Public identity returned after signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearcherSummary {
    pub id: ResearcherId,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub token: String,
    pub researcher: ResearcherSummary,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub researcher: ResearcherSummary,
    pub last_login: DateTime<Utc>,
}

/// Profile view of an active researcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearcherProfile {
    pub id: ResearcherId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub days_since_registration: i64,
}

#[derive(Clone)]
pub struct AuthService {
    pool: StorePool,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(pool: StorePool, hasher: PasswordHasher, tokens: Arc<TokenService>) -> Self {
        Self {
            pool,
            hasher,
            tokens,
        }
    }

    pub async fn signup(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SignupOutcome, AuthServiceError> {
        validate_signup(username, password)?;

        let password_hash = self.hasher.hash_blocking(password).await?;
        let new_researcher = NewResearcher {
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };

        let id = self
            .pool
            .run(move |store| store.register_researcher(new_researcher))
            .await
            .map_err(|err| match err {
                StoreError::UsernameTaken => AuthServiceError::UsernameTaken,
                other => AuthServiceError::Store(other),
            })?;

        // The account is already committed; a minting failure leaves it
        // usable through login.
        let issued = self.tokens.issue(id, username).inspect_err(|err| {
            error!(researcher_id = %id, error = %err, "Registered researcher but token minting failed");
        })?;
        info!(researcher_id = %id, "Researcher registered");

        Ok(SignupOutcome {
            token: issued.token,
            researcher: ResearcherSummary {
                id,
                username: username.to_string(),
            },
        })
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        origin_ip: Option<String>,
    ) -> Result<LoginOutcome, AuthServiceError> {
        validate_login(username, password)?;

        let lookup = username.to_string();
        let record = self
            .pool
            .run(move |store| store.find_by_username(&lookup))
            .await?;

        let Some(record) = record else {
            self.hasher.verify_dummy_blocking(password).await;
            return Err(self.refuse(LoginFailure::UnknownUser));
        };

        if !self
            .hasher
            .verify_blocking(password, &record.password_hash)
            .await?
        {
            return Err(self.refuse(LoginFailure::PasswordMismatch));
        }

        if !record.is_active {
            info!(researcher_id = %record.id, "Login refused: account deactivated");
            return Err(AuthServiceError::AccountDeactivated);
        }

        let id = record.id;
        let now = Utc::now();
        let updated = self
            .pool
            .run(move |store| store.record_login(id, now))
            .await?;

        self.spawn_session_audit(id, origin_ip);

        let issued = self.tokens.issue(id, &updated.username)?;
        info!(researcher_id = %id, "Researcher logged in");

        Ok(LoginOutcome {
            token: issued.token,
            researcher: ResearcherSummary {
                id,
                username: updated.username,
            },
            last_login: updated.last_login.unwrap_or(now),
        })
    }

    pub async fn profile(&self, id: ResearcherId) -> Result<ResearcherProfile, AuthServiceError> {
        let record = self
            .pool
            .run(move |store| store.find_by_id(id))
            .await?
            .filter(|record| record.is_active)
            .ok_or(AuthServiceError::NotFound)?;

        let days_since_registration = days_between(record.created_at, Utc::now());

        Ok(ResearcherProfile {
            id: record.id,
            username: record.username,
            created_at: record.created_at,
            last_login: record.last_login,
            days_since_registration,
        })
    }

    pub async fn stats(&self) -> Result<ResearcherStats, AuthServiceError> {
        let now = Utc::now();
        Ok(self
            .pool
            .run(move |store| store.researcher_stats(now))
            .await?)
    }

    fn refuse(&self, reason: LoginFailure) -> AuthServiceError {
        info!(reason = reason.as_str(), "Login refused");
        AuthServiceError::InvalidCredentials(reason)
    }

    /// Best-effort session audit write, detached from the request.
    fn spawn_session_audit(&self, id: ResearcherId, origin_ip: Option<String>) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let session = SessionRecord::new(id, origin_ip);
            if let Err(err) = pool.run(move |store| store.create_session(session)).await {
                warn!(researcher_id = %id, error = %err, "Failed to record session audit entry");
            }
        });
    }
}

/// Calendar-day boundaries (UTC) crossed between `from` and `to`.
fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}
