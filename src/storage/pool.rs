// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded access to the researcher store.
//!
//! The pool hands out at most `max_connections` concurrent store operations.
//! Further callers queue on the semaphore until a slot frees up, or fail with
//! [`StoreError::PoolTimeout`] when an acquire timeout is configured. Each
//! operation runs on tokio's blocking thread pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{ResearcherStore, StoreError, StoreResult};

/// Default upper bound on concurrent store operations.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Pool sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePoolConfig {
    /// Maximum number of store operations in flight.
    pub max_connections: usize,
    /// How long a caller may wait for a slot. `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
}

impl Default for StorePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: None,
        }
    }
}

/// Process-wide handle to the store. Cheap to clone.
#[derive(Clone)]
pub struct StorePool {
    store: Arc<dyn ResearcherStore>,
    permits: Arc<Semaphore>,
    config: StorePoolConfig,
}

impl StorePool {
    pub fn new(store: Arc<dyn ResearcherStore>, config: StorePoolConfig) -> Self {
        let max = config.max_connections.max(1);
        Self {
            store,
            permits: Arc::new(Semaphore::new(max)),
            config,
        }
    }

    pub fn config(&self) -> &StorePoolConfig {
        &self.config
    }

    /// Run one blocking store operation while holding a pool slot.
    pub async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn ResearcherStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.acquire().await?;
        let store = Arc::clone(&self.store);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            op(store.as_ref())
        })
        .await
        .map_err(|e| StoreError::Backend(format!("store task failed: {e}")))?
    }

    /// Whether the store answers a liveness probe.
    ///
    /// Never queues: a pool with no free slot reports unhealthy.
    pub async fn is_healthy(&self) -> bool {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            return false;
        };
        let store = Arc::clone(&self.store);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            store.ping()
        })
        .await
        .is_ok_and(|result| result.is_ok())
    }

    /// Refuse new operations. In-flight operations finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    async fn acquire(&self) -> StoreResult<OwnedSemaphorePermit> {
        let acquire = Arc::clone(&self.permits).acquire_owned();
        let permit = match self.config.acquire_timeout {
            Some(timeout) => tokio::time::timeout(timeout, acquire)
                .await
                .map_err(|_| StoreError::PoolTimeout)?,
            None => acquire.await,
        };
        permit.map_err(|_| StoreError::Closed)
    }
}
