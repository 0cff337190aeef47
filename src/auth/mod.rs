// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential verification and bearer-token sessions for the ExoQuest
//! Research API.
//!
//! ## Auth Flow
//!
//! 1. Client signs up or logs in with `username` / `password`
//! 2. Server verifies the password against the stored bcrypt verifier and
//!    returns a signed HS256 token (24 h lifetime by default)
//! 3. Client sends `Authorization: Bearer <token>` on protected routes
//! 4. The gate verifies signature and expiry, then injects
//!    [`AuthenticatedResearcher`] into the request
//!
//! ## Security
//!
//! - Unknown usernames and wrong passwords are indistinguishable to clients
//! - Tokens are not revocable; deactivation only blocks new logins
//! - No clock-skew leeway on expiry

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;
pub mod validation;

pub use claims::{AuthenticatedResearcher, TokenClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::require_auth;
pub use password::{PasswordError, PasswordHasher};
pub use service::{AuthService, AuthServiceError, LoginFailure};
pub use token::{IssuedToken, TokenError, TokenService};
pub use validation::ValidationError;
