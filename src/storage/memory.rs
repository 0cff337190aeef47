// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory researcher store.
//!
//! Keeps everything in process-local maps behind a single `RwLock`. Used by
//! tests and local experiments; nothing survives a restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};

use super::{
    apply_interaction, username_key, InteractionKind, NewPost, NewResearcher, PostId, PostRecord,
    PostWithAuthor, ResearcherId, ResearcherRecord, ResearcherStats, ResearcherStore,
    SessionRecord, StoreError, StoreResult,
};

#[derive(Default)]
struct Tables {
    researchers: HashMap<ResearcherId, ResearcherRecord>,
    usernames: HashMap<String, ResearcherId>,
    sessions: Vec<SessionRecord>,
    posts: HashMap<PostId, PostRecord>,
    next_researcher_id: u64,
    next_post_id: u64,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of session audit rows recorded so far.
    pub fn session_count(&self) -> usize {
        self.read().map(|t| t.sessions.len()).unwrap_or_default()
    }

    /// Number of researcher records.
    pub fn researcher_count(&self) -> usize {
        self.read().map(|t| t.researchers.len()).unwrap_or_default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

impl ResearcherStore for InMemoryStore {
    fn register_researcher(&self, researcher: NewResearcher) -> StoreResult<ResearcherId> {
        let mut tables = self.write()?;
        let key = username_key(&researcher.username);
        if tables.usernames.contains_key(&key) {
            return Err(StoreError::UsernameTaken);
        }

        tables.next_researcher_id += 1;
        let id = ResearcherId(tables.next_researcher_id);
        tables.usernames.insert(key, id);
        tables.researchers.insert(
            id,
            ResearcherRecord {
                id,
                username: researcher.username,
                password_hash: researcher.password_hash,
                is_active: true,
                created_at: researcher.created_at,
                last_login: None,
            },
        );
        Ok(id)
    }

    fn find_by_username(&self, username: &str) -> StoreResult<Option<ResearcherRecord>> {
        let tables = self.read()?;
        Ok(tables
            .usernames
            .get(&username_key(username))
            .and_then(|id| tables.researchers.get(id))
            .cloned())
    }

    fn find_by_id(&self, id: ResearcherId) -> StoreResult<Option<ResearcherRecord>> {
        Ok(self.read()?.researchers.get(&id).cloned())
    }

    fn record_login(&self, id: ResearcherId, at: DateTime<Utc>) -> StoreResult<ResearcherRecord> {
        let mut tables = self.write()?;
        let Some(record) = tables.researchers.get_mut(&id) else {
            return Err(StoreError::NotFound(format!("Researcher {id}")));
        };
        record.last_login = Some(at);
        Ok(record.clone())
    }

    fn set_active(&self, id: ResearcherId, active: bool) -> StoreResult<()> {
        let mut tables = self.write()?;
        let Some(record) = tables.researchers.get_mut(&id) else {
            return Err(StoreError::NotFound(format!("Researcher {id}")));
        };
        record.is_active = active;
        Ok(())
    }

    fn create_session(&self, session: SessionRecord) -> StoreResult<()> {
        self.write()?.sessions.push(session);
        Ok(())
    }

    fn researcher_stats(&self, now: DateTime<Utc>) -> StoreResult<ResearcherStats> {
        let tables = self.read()?;
        let since = now - Duration::hours(24);
        Ok(ResearcherStats {
            total_researchers: tables.researchers.len() as u64,
            active_researchers: tables.researchers.values().filter(|r| r.is_active).count() as u64,
            total_logins: tables.sessions.len() as u64,
            logins_last24_hours: tables
                .sessions
                .iter()
                .filter(|s| s.created_at >= since)
                .count() as u64,
            total_posts: tables.posts.len() as u64,
        })
    }

    fn create_post(&self, post: NewPost) -> StoreResult<PostId> {
        let mut tables = self.write()?;
        if !tables.researchers.contains_key(&post.author_id) {
            return Err(StoreError::NotFound(format!("Researcher {}", post.author_id)));
        }

        tables.next_post_id += 1;
        let id = tables.next_post_id;
        tables.posts.insert(
            id,
            PostRecord {
                id,
                author_id: post.author_id,
                title: post.title,
                content: post.content,
                category: post.category,
                tags: post.tags,
                likes: 0,
                comments: 0,
                shares: 0,
                created_at: post.created_at,
            },
        );
        Ok(id)
    }

    fn list_posts(&self) -> StoreResult<Vec<PostWithAuthor>> {
        let tables = self.read()?;
        let mut posts: Vec<PostWithAuthor> = tables
            .posts
            .values()
            .map(|post| PostWithAuthor {
                author_username: tables
                    .researchers
                    .get(&post.author_id)
                    .map(|r| r.username.clone())
                    .unwrap_or_default(),
                post: post.clone(),
            })
            .collect();

        // Newest first; ids break ties between posts created in the same instant.
        posts.sort_by(|a, b| {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then(b.post.id.cmp(&a.post.id))
        });
        Ok(posts)
    }

    fn record_interaction(&self, post_id: PostId, kind: InteractionKind) -> StoreResult<()> {
        let mut tables = self.write()?;
        let Some(post) = tables.posts.get_mut(&post_id) else {
            return Err(StoreError::NotFound(format!("Post {post_id}")));
        };
        apply_interaction(post, kind);
        Ok(())
    }

    fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
