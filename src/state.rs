// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthService, PasswordHasher, TokenService};
use crate::storage::StorePool;

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pool: StorePool,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(pool: StorePool, tokens: TokenService, hasher: PasswordHasher) -> Self {
        let tokens = Arc::new(tokens);
        let auth = AuthService::new(pool.clone(), hasher, Arc::clone(&tokens));
        Self { pool, tokens, auth }
    }
}

#[cfg(test)]
pub(crate) const TEST_SECRET: &[u8] = b"exoquest-test-secret-0123456789abcdef";

#[cfg(test)]
impl AppState {
    /// In-memory store, fixed secret, cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        Self::for_tests_with_store().0
    }

    /// Like [`AppState::for_tests`], also returning the backing store.
    pub fn for_tests_with_store() -> (Self, Arc<crate::storage::InMemoryStore>) {
        use crate::auth::password::MIN_BCRYPT_COST;
        use crate::auth::token::DEFAULT_TOKEN_TTL;
        use crate::storage::{InMemoryStore, StorePoolConfig};

        let store = Arc::new(InMemoryStore::new());
        let pool = StorePool::new(store.clone(), StorePoolConfig::default());
        let state = Self::new(
            pool,
            TokenService::new(TEST_SECRET, DEFAULT_TOKEN_TTL),
            PasswordHasher::new(MIN_BCRYPT_COST),
        );
        (state, store)
    }
}
