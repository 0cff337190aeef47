// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! Request fields are optional at the serde level so that a missing field
//! produces the endpoint's own validation message instead of a generic
//! deserialization error.
//!
//! ## Model Categories
//!
//! - **Auth**: signup, login, profile
//! - **Posts**: research posts and interactions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::service::{LoginOutcome, ResearcherProfile, SignupOutcome};
use crate::storage::{InteractionKind, PostCategory, PostId, PostWithAuthor, ResearcherId};

// =============================================================================
// Auth Models
// =============================================================================

/// Credentials submitted to `POST /api/auth/signup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Credentials submitted to `POST /api/auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResearcherSummary {
    pub id: ResearcherId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    pub token: String,
    pub researcher: ResearcherSummary,
}

impl From<SignupOutcome> for SignupResponse {
    fn from(outcome: SignupOutcome) -> Self {
        Self {
            message: "Researcher account created successfully".to_string(),
            token: outcome.token,
            researcher: ResearcherSummary {
                id: outcome.researcher.id,
                username: outcome.researcher.username,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoggedInResearcher {
    pub id: ResearcherId,
    pub username: String,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub researcher: LoggedInResearcher,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            message: "Login successful".to_string(),
            token: outcome.token,
            researcher: LoggedInResearcher {
                id: outcome.researcher.id,
                username: outcome.researcher.username,
                last_login: outcome.last_login,
            },
        }
    }
}

/// Profile of the authenticated researcher.
///
/// Field names keep the column-style casing the portal frontend reads.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(rename = "ResearcherID")]
    pub researcher_id: ResearcherId,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "LastLogin")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(rename = "DaysSinceRegistration")]
    pub days_since_registration: i64,
}

impl From<ResearcherProfile> for ProfileResponse {
    fn from(profile: ResearcherProfile) -> Self {
        Self {
            researcher_id: profile.id,
            username: profile.username,
            created_at: profile.created_at,
            last_login: profile.last_login,
            days_since_registration: profile.days_since_registration,
        }
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Post Models
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// One of `AI_MODEL`, `OBSERVATION`, `ANALYSIS`, `DISCUSSION`.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostResponse {
    pub message: String,
    pub post_id: PostId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InteractRequest {
    /// `like`, `comment` or `share`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl InteractRequest {
    pub fn interaction(&self) -> Option<InteractionKind> {
        match self.kind.as_deref()? {
            "like" => Some(InteractionKind::Like),
            "comment" => Some(InteractionKind::Comment),
            "share" => Some(InteractionKind::Share),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PostAuthor {
    pub name: String,
    pub title: String,
    pub institution: String,
    pub avatar: String,
    pub badges: Vec<String>,
}

/// Research post as rendered in the community feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPost {
    pub id: String,
    pub author: PostAuthor,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub created_at: DateTime<Utc>,
    pub category: PostCategory,
}

impl From<PostWithAuthor> for ResearchPost {
    fn from(entry: PostWithAuthor) -> Self {
        let post = entry.post;
        Self {
            id: post.id.to_string(),
            author: PostAuthor {
                avatar: avatar_initials(&entry.author_username),
                name: entry.author_username,
                title: "Researcher".to_string(),
                institution: "Research Institution".to_string(),
                badges: vec!["Verified Member".to_string()],
            },
            title: post.title,
            content: post.content,
            tags: post.tags,
            likes: post.likes,
            comments: post.comments,
            shares: post.shares,
            created_at: post.created_at,
            category: post.category,
        }
    }
}

/// Two-letter avatar for a username.
///
/// `first.last` style names use the first letter of each of the first two
/// parts; anything else uses the first two characters.
pub fn avatar_initials(username: &str) -> String {
    let mut parts = username.split('.');
    let initials: String = match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => first.chars().take(1).chain(second.chars().take(1)).collect(),
        _ => username.chars().take(2).collect(),
    };
    initials.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PostRecord;

    #[test]
    fn avatar_initials_cases() {
        assert_eq!(avatar_initials("jane.doe"), "JD");
        assert_eq!(avatar_initials("a.b.c"), "AB");
        assert_eq!(avatar_initials("researcher_01"), "RE");
        assert_eq!(avatar_initials("x"), "X");
        assert_eq!(avatar_initials("x."), "X");
    }

    #[test]
    fn profile_uses_column_names() {
        let created_at = Utc::now();
        let json = serde_json::to_value(ProfileResponse {
            researcher_id: ResearcherId(3),
            username: "researcher_01".to_string(),
            created_at,
            last_login: None,
            days_since_registration: 0,
        })
        .unwrap();

        assert_eq!(json["ResearcherID"], 3);
        assert_eq!(json["Username"], "researcher_01");
        assert!(json["LastLogin"].is_null());
        assert_eq!(json["DaysSinceRegistration"], 0);
    }

    #[test]
    fn research_post_shape() {
        let created_at = Utc::now();
        let post: ResearchPost = PostWithAuthor {
            post: PostRecord {
                id: 12,
                author_id: ResearcherId(1),
                title: "Transit depth anomaly".to_string(),
                content: "Seeing a dip in KOI-7016".to_string(),
                category: PostCategory::Observation,
                tags: vec!["kepler".to_string()],
                likes: 2,
                comments: 1,
                shares: 0,
                created_at,
            },
            author_username: "jane.doe".to_string(),
        }
        .into();

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["id"], "12");
        assert_eq!(json["author"]["avatar"], "JD");
        assert_eq!(json["author"]["title"], "Researcher");
        assert_eq!(json["author"]["institution"], "Research Institution");
        assert_eq!(json["author"]["badges"][0], "Verified Member");
        assert_eq!(json["category"], "OBSERVATION");
        assert_eq!(json["likes"], 2);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn interaction_type_parsing() {
        let parse = |json: &str| serde_json::from_str::<InteractRequest>(json).unwrap().interaction();
        assert_eq!(parse(r#"{"type":"like"}"#), Some(InteractionKind::Like));
        assert_eq!(parse(r#"{"type":"share"}"#), Some(InteractionKind::Share));
        assert_eq!(parse(r#"{"type":"Like"}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }

    #[test]
    fn login_response_uses_camel_case_last_login() {
        let json = serde_json::to_value(LoggedInResearcher {
            id: ResearcherId(1),
            username: "researcher_01".to_string(),
            last_login: Utc::now(),
        })
        .unwrap();
        assert!(json.get("lastLogin").is_some());
    }
}
