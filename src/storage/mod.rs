// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Researcher Storage
//!
//! This module owns every persistent record the API touches: researcher
//! credentials, login session audit rows, research posts and their
//! interaction counters.
//!
//! ## Backends
//!
//! - [`RedbStore`] - embedded ACID database (redb), used by the server binary
//! - [`InMemoryStore`] - process-local maps, used by tests
//!
//! Both implement [`ResearcherStore`]. Handlers never call a backend directly;
//! they go through [`StorePool`], which bounds concurrent store operations and
//! moves the blocking work off the async executor.
//!
//! ## Username Policy
//!
//! Usernames are unique case-insensitively. The record keeps the spelling
//! used at registration and lookups by username ignore case.

pub mod memory;
pub mod pool;
pub mod redb_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use memory::InMemoryStore;
pub use pool::{StorePool, StorePoolConfig};
pub use redb_store::RedbStore;

// =============================================================================
// Identifiers
// =============================================================================

/// Store-assigned researcher identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ResearcherId(pub u64);

impl std::fmt::Display for ResearcherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResearcherId {
    fn from(value: u64) -> Self {
        ResearcherId(value)
    }
}

/// Store-assigned research post identifier.
pub type PostId = u64;

// =============================================================================
// Records
// =============================================================================

/// Credential record of a researcher.
///
/// `password_hash` is a bcrypt verifier and must never leave the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearcherRecord {
    pub id: ResearcherId,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Input for [`ResearcherStore::register_researcher`].
#[derive(Debug, Clone)]
pub struct NewResearcher {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One row per successful login. Written, never read back by the auth flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: String,
    pub researcher_id: ResearcherId,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(researcher_id: ResearcherId, ip_address: Option<String>) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            researcher_id,
            ip_address,
            created_at: Utc::now(),
        }
    }
}

/// Research post category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostCategory {
    AiModel,
    Observation,
    Analysis,
    Discussion,
}

impl PostCategory {
    /// Parse the wire name (`AI_MODEL`, `OBSERVATION`, ...).
    pub fn from_wire(s: &str) -> Option<PostCategory> {
        match s {
            "AI_MODEL" => Some(PostCategory::AiModel),
            "OBSERVATION" => Some(PostCategory::Observation),
            "ANALYSIS" => Some(PostCategory::Analysis),
            "DISCUSSION" => Some(PostCategory::Discussion),
            _ => None,
        }
    }
}

/// Stored research post with its interaction counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRecord {
    pub id: PostId,
    pub author_id: ResearcherId,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub tags: Vec<String>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub created_at: DateTime<Utc>,
}

/// Input for [`ResearcherStore::create_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: ResearcherId,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Post joined with its author's username, newest first in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithAuthor {
    pub post: PostRecord,
    pub author_username: String,
}

/// Counter bumped by a post interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Comment,
    Share,
}

/// Aggregate researcher statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearcherStats {
    pub total_researchers: u64,
    pub active_researchers: u64,
    pub total_logins: u64,
    pub logins_last24_hours: u64,
    pub total_posts: u64,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already exists")]
    UsernameTaken,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store pool is closed")]
    Closed,

    #[error("timed out waiting for a store connection")]
    PoolTimeout,

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store Trait
// =============================================================================

/// Persistence boundary of the service.
///
/// Methods are blocking; async callers go through [`StorePool::run`].
pub trait ResearcherStore: Send + Sync {
    /// Insert a new researcher, active, with no last login.
    ///
    /// Fails with [`StoreError::UsernameTaken`] when the username is in use.
    fn register_researcher(&self, researcher: NewResearcher) -> StoreResult<ResearcherId>;

    /// Look up a researcher by username (case-insensitive).
    fn find_by_username(&self, username: &str) -> StoreResult<Option<ResearcherRecord>>;

    /// Look up a researcher by id.
    fn find_by_id(&self, id: ResearcherId) -> StoreResult<Option<ResearcherRecord>>;

    /// Set `last_login` to `at` and return the updated record.
    fn record_login(&self, id: ResearcherId, at: DateTime<Utc>) -> StoreResult<ResearcherRecord>;

    /// Activate or deactivate an account.
    fn set_active(&self, id: ResearcherId, active: bool) -> StoreResult<()>;

    /// Append a login session audit row.
    fn create_session(&self, session: SessionRecord) -> StoreResult<()>;

    /// Aggregate statistics as of `now`.
    fn researcher_stats(&self, now: DateTime<Utc>) -> StoreResult<ResearcherStats>;

    /// Insert a new post with zeroed counters.
    fn create_post(&self, post: NewPost) -> StoreResult<PostId>;

    /// All posts, newest first.
    fn list_posts(&self) -> StoreResult<Vec<PostWithAuthor>>;

    /// Increment one counter of a post.
    fn record_interaction(&self, post_id: PostId, kind: InteractionKind) -> StoreResult<()>;

    /// Cheap liveness probe.
    fn ping(&self) -> StoreResult<()>;
}

/// Normalize a username to its uniqueness key.
pub(crate) fn username_key(username: &str) -> String {
    username.to_lowercase()
}

pub(crate) fn apply_interaction(post: &mut PostRecord, kind: InteractionKind) {
    match kind {
        InteractionKind::Like => post.likes += 1,
        InteractionKind::Comment => post.comments += 1,
        InteractionKind::Share => post.shares += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names_round_trip() {
        for (wire, category) in [
            ("AI_MODEL", PostCategory::AiModel),
            ("OBSERVATION", PostCategory::Observation),
            ("ANALYSIS", PostCategory::Analysis),
            ("DISCUSSION", PostCategory::Discussion),
        ] {
            assert_eq!(PostCategory::from_wire(wire), Some(category));
            assert_eq!(
                serde_json::to_string(&category).unwrap(),
                format!("\"{wire}\"")
            );
        }
        assert_eq!(PostCategory::from_wire("ai_model"), None);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let stats = ResearcherStats {
            total_researchers: 3,
            active_researchers: 2,
            total_logins: 5,
            logins_last24_hours: 1,
            total_posts: 4,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalResearchers"], 3);
        assert_eq!(json["loginsLast24Hours"], 1);
    }
}
