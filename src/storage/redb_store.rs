// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded researcher database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `researchers`: researcher id → serialized ResearcherRecord
//! - `username_index`: lowercase username → researcher id
//! - `sessions`: session id → serialized SessionRecord
//! - `posts`: post id → serialized PostRecord
//! - `sequences`: sequence name → last assigned id

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::{
    apply_interaction, username_key, InteractionKind, NewPost, NewResearcher, PostId, PostRecord,
    PostWithAuthor, ResearcherId, ResearcherRecord, ResearcherStats, ResearcherStore,
    SessionRecord, StoreError, StoreResult,
};

// =============================================================================
// Table Definitions
// =============================================================================

const RESEARCHERS: TableDefinition<u64, &[u8]> = TableDefinition::new("researchers");

const USERNAME_INDEX: TableDefinition<&str, u64> = TableDefinition::new("username_index");

const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

const POSTS: TableDefinition<u64, &[u8]> = TableDefinition::new("posts");

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const RESEARCHER_SEQ: &str = "researcher_id";
const POST_SEQ: &str = "post_id";

// =============================================================================
// RedbStore
// =============================================================================

/// Researcher store persisted in a single redb file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RESEARCHERS)?;
            let _ = write_txn.open_table(USERNAME_INDEX)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(POSTS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Read-modify-write a researcher record inside one write transaction.
    fn update_researcher(
        &self,
        id: ResearcherId,
        update: impl FnOnce(&mut ResearcherRecord),
    ) -> StoreResult<ResearcherRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(RESEARCHERS)?;

            let existing_bytes = {
                let existing = table
                    .get(id.0)?
                    .ok_or_else(|| StoreError::NotFound(format!("Researcher {id}")))?;
                existing.value().to_vec()
            };

            let mut record: ResearcherRecord = serde_json::from_slice(&existing_bytes)?;
            update(&mut record);

            let json = serde_json::to_vec(&record)?;
            table.insert(id.0, json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }
}

/// Bump and return the named sequence within an open write transaction.
fn next_sequence(write_txn: &WriteTransaction, name: &str) -> StoreResult<u64> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let next = table.get(name)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(name, next)?;
    Ok(next)
}

impl ResearcherStore for RedbStore {
    fn register_researcher(&self, researcher: NewResearcher) -> StoreResult<ResearcherId> {
        let key = username_key(&researcher.username);

        let write_txn = self.db.begin_write()?;
        let id = {
            let mut usernames = write_txn.open_table(USERNAME_INDEX)?;
            if usernames.get(key.as_str())?.is_some() {
                return Err(StoreError::UsernameTaken);
            }

            let id = ResearcherId(next_sequence(&write_txn, RESEARCHER_SEQ)?);
            usernames.insert(key.as_str(), id.0)?;

            let record = ResearcherRecord {
                id,
                username: researcher.username,
                password_hash: researcher.password_hash,
                is_active: true,
                created_at: researcher.created_at,
                last_login: None,
            };
            let json = serde_json::to_vec(&record)?;
            let mut researchers = write_txn.open_table(RESEARCHERS)?;
            researchers.insert(id.0, json.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    fn find_by_username(&self, username: &str) -> StoreResult<Option<ResearcherRecord>> {
        let key = username_key(username);
        let read_txn = self.db.begin_read()?;

        let usernames = read_txn.open_table(USERNAME_INDEX)?;
        let Some(id) = usernames.get(key.as_str())?.map(|v| v.value()) else {
            return Ok(None);
        };

        let researchers = read_txn.open_table(RESEARCHERS)?;
        let record = match researchers.get(id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(record)
    }

    fn find_by_id(&self, id: ResearcherId) -> StoreResult<Option<ResearcherRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESEARCHERS)?;
        let record = match table.get(id.0)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(record)
    }

    fn record_login(&self, id: ResearcherId, at: DateTime<Utc>) -> StoreResult<ResearcherRecord> {
        self.update_researcher(id, |record| record.last_login = Some(at))
    }

    fn set_active(&self, id: ResearcherId, active: bool) -> StoreResult<()> {
        self.update_researcher(id, |record| record.is_active = active)
            .map(|_| ())
    }

    fn create_session(&self, session: SessionRecord) -> StoreResult<()> {
        let json = serde_json::to_vec(&session)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            table.insert(session.session_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn researcher_stats(&self, now: DateTime<Utc>) -> StoreResult<ResearcherStats> {
        let read_txn = self.db.begin_read()?;
        let mut stats = ResearcherStats::default();

        let researchers = read_txn.open_table(RESEARCHERS)?;
        for entry in researchers.iter()? {
            let (_, value) = entry?;
            let record: ResearcherRecord = serde_json::from_slice(value.value())?;
            stats.total_researchers += 1;
            if record.is_active {
                stats.active_researchers += 1;
            }
        }

        let since = now - Duration::hours(24);
        let sessions = read_txn.open_table(SESSIONS)?;
        for entry in sessions.iter()? {
            let (_, value) = entry?;
            let session: SessionRecord = serde_json::from_slice(value.value())?;
            stats.total_logins += 1;
            if session.created_at >= since {
                stats.logins_last24_hours += 1;
            }
        }

        let posts = read_txn.open_table(POSTS)?;
        for entry in posts.iter()? {
            entry?;
            stats.total_posts += 1;
        }

        Ok(stats)
    }

    fn create_post(&self, post: NewPost) -> StoreResult<PostId> {
        let write_txn = self.db.begin_write()?;
        let id = {
            {
                let researchers = write_txn.open_table(RESEARCHERS)?;
                if researchers.get(post.author_id.0)?.is_none() {
                    return Err(StoreError::NotFound(format!("Researcher {}", post.author_id)));
                }
            }

            let id = next_sequence(&write_txn, POST_SEQ)?;
            let record = PostRecord {
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
            };
            let json = serde_json::to_vec(&record)?;
            let mut posts = write_txn.open_table(POSTS)?;
            posts.insert(id, json.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    fn list_posts(&self) -> StoreResult<Vec<PostWithAuthor>> {
        let read_txn = self.db.begin_read()?;
        let posts_table = read_txn.open_table(POSTS)?;
        let researchers = read_txn.open_table(RESEARCHERS)?;

        let mut authors: HashMap<ResearcherId, String> = HashMap::new();
        let mut posts = Vec::new();

        for entry in posts_table.iter()? {
            let (_, value) = entry?;
            let post: PostRecord = serde_json::from_slice(value.value())?;

            if !authors.contains_key(&post.author_id) {
                let username = match researchers.get(post.author_id.0)? {
                    Some(v) => serde_json::from_slice::<ResearcherRecord>(v.value())?.username,
                    None => String::new(),
                };
                authors.insert(post.author_id, username);
            }

            posts.push(PostWithAuthor {
                author_username: authors
                    .get(&post.author_id)
                    .cloned()
                    .unwrap_or_default(),
                post,
            });
        }

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
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(POSTS)?;

            let existing_bytes = {
                let existing = table
                    .get(post_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("Post {post_id}")))?;
                existing.value().to_vec()
            };

            let mut post: PostRecord = serde_json::from_slice(&existing_bytes)?;
            apply_interaction(&mut post, kind);

            let json = serde_json::to_vec(&post)?;
            table.insert(post_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(SEQUENCES)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PostCategory;

    fn temp_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    fn new_researcher(username: &str) -> NewResearcher {
        NewResearcher {
            username: username.to_string(),
            password_hash: "$2b$04$notarealhash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn register_and_find() {
        let (store, _dir) = temp_store();
        let id = store
            .register_researcher(new_researcher("researcher_01"))
            .unwrap();
        assert_eq!(id, ResearcherId(1));

        let by_name = store.find_by_username("Researcher_01").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_name.username, "researcher_01");
        assert!(by_name.is_active);

        let by_id = store.find_by_id(id).unwrap().unwrap();
        assert_eq!(by_id, by_name);

        assert!(store.find_by_username("nobody").unwrap().is_none());
        assert!(store.find_by_id(ResearcherId(7)).unwrap().is_none());
    }

    #[test]
    fn duplicate_username_leaves_single_record() {
        let (store, _dir) = temp_store();
        store.register_researcher(new_researcher("vega")).unwrap();

        let result = store.register_researcher(new_researcher("VEGA"));
        assert!(matches!(result, Err(StoreError::UsernameTaken)));

        // The aborted transaction must not have consumed an id either.
        let next = store.register_researcher(new_researcher("altair")).unwrap();
        assert_eq!(next, ResearcherId(2));
        assert_eq!(store.researcher_stats(Utc::now()).unwrap().total_researchers, 2);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("exoquest.redb");
        let id = {
            let store = RedbStore::open(&path).unwrap();
            store.register_researcher(new_researcher("deneb")).unwrap()
        };

        let reopened = RedbStore::open(&path).unwrap();
        assert_eq!(
            reopened.find_by_id(id).unwrap().unwrap().username,
            "deneb"
        );
    }

    #[test]
    fn login_and_activation_updates() {
        let (store, _dir) = temp_store();
        let id = store.register_researcher(new_researcher("rigel")).unwrap();

        let at = Utc::now();
        let record = store.record_login(id, at).unwrap();
        assert_eq!(record.last_login, Some(at));

        store.set_active(id, false).unwrap();
        assert!(!store.find_by_id(id).unwrap().unwrap().is_active);
        store.set_active(id, true).unwrap();
        assert!(store.find_by_id(id).unwrap().unwrap().is_active);

        assert!(matches!(
            store.record_login(ResearcherId(404), at),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn posts_and_interactions() {
        let (store, _dir) = temp_store();
        let author = store.register_researcher(new_researcher("sirius")).unwrap();
        let base = Utc::now();

        let first = store
            .create_post(NewPost {
                author_id: author,
                title: "Light curve dips".to_string(),
                content: "Periodic dips in KIC 8462852".to_string(),
                category: PostCategory::Observation,
                tags: vec!["kepler".to_string(), "dips".to_string()],
                created_at: base - Duration::minutes(1),
            })
            .unwrap();
        let second = store
            .create_post(NewPost {
                author_id: author,
                title: "XGBoost baseline".to_string(),
                content: "Accuracy on KOI table".to_string(),
                category: PostCategory::AiModel,
                tags: vec![],
                created_at: base,
            })
            .unwrap();

        store.record_interaction(first, InteractionKind::Comment).unwrap();
        store.record_interaction(first, InteractionKind::Comment).unwrap();

        let posts = store.list_posts().unwrap();
        assert_eq!(
            posts.iter().map(|p| p.post.id).collect::<Vec<_>>(),
            vec![second, first]
        );
        assert_eq!(posts[1].post.comments, 2);
        assert_eq!(posts[1].post.tags, vec!["kepler", "dips"]);
        assert_eq!(posts[1].author_username, "sirius");

        assert!(matches!(
            store.record_interaction(999, InteractionKind::Like),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.create_post(NewPost {
                author_id: ResearcherId(999),
                title: "t".to_string(),
                content: "c".to_string(),
                category: PostCategory::Discussion,
                tags: vec![],
                created_at: base,
            }),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn stats_and_ping() {
        let (store, _dir) = temp_store();
        store.ping().unwrap();

        let id = store.register_researcher(new_researcher("polaris")).unwrap();
        store
            .create_session(SessionRecord::new(id, Some("10.0.0.1".to_string())))
            .unwrap();

        let stats = store.researcher_stats(Utc::now()).unwrap();
        assert_eq!(stats.total_researchers, 1);
        assert_eq!(stats.active_researchers, 1);
        assert_eq!(stats.total_logins, 1);
        assert_eq!(stats.logins_last24_hours, 1);

        let later = store.researcher_stats(Utc::now() + Duration::days(2)).unwrap();
        assert_eq!(later.logins_last24_hours, 0);
    }
}
