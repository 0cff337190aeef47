// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and verification (bcrypt).

use std::sync::{Arc, OnceLock};

/// bcrypt cost used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest cost bcrypt accepts.
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_BCRYPT_COST: u32 = 31;

/// Plaintext hashed once to build the dummy verifier for unknown usernames.
const DUMMY_PASSWORD: &str = "exoquest-dummy-password";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password task failed: {0}")]
    Task(String),
}

/// One-way adaptive password hasher.
///
/// Each call to [`PasswordHasher::hash`] draws a fresh random salt, so equal
/// passwords produce different verifiers. The work is CPU-bound; async
/// callers run it on the blocking pool.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    cost: u32,
    dummy: Arc<OnceLock<Option<String>>>,
}

impl PasswordHasher {
    /// `cost` is clamped to bcrypt's supported range.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            dummy: Arc::new(OnceLock::new()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Derive a storable verifier from `plaintext`.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Check `plaintext` against a stored verifier.
    ///
    /// A malformed verifier yields `false`.
    pub fn verify(&self, plaintext: &str, verifier: &str) -> bool {
        bcrypt::verify(plaintext, verifier).unwrap_or(false)
    }

    /// Spend one verification's worth of work without a real verifier.
    ///
    /// Keeps the unknown-username login path as slow as a wrong password.
    pub fn verify_dummy(&self, plaintext: &str) {
        let dummy = self
            .dummy
            .get_or_init(|| bcrypt::hash(DUMMY_PASSWORD, self.cost).ok());
        if let Some(verifier) = dummy {
            let _ = self.verify(plaintext, verifier);
        }
    }

    /// [`PasswordHasher::hash`] on the blocking thread pool.
    pub async fn hash_blocking(&self, plaintext: &str) -> Result<String, PasswordError> {
        let hasher = self.clone();
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// [`PasswordHasher::verify`] on the blocking thread pool.
    pub async fn verify_blocking(&self, plaintext: &str, verifier: &str) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        let plaintext = plaintext.to_owned();
        let verifier = verifier.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &verifier))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))
    }

    /// [`PasswordHasher::verify_dummy`] on the blocking thread pool.
    pub async fn verify_dummy_blocking(&self, plaintext: &str) {
        let hasher = self.clone();
        let plaintext = plaintext.to_owned();
        let _ = tokio::task::spawn_blocking(move || hasher.verify_dummy(&plaintext)).await;
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}
