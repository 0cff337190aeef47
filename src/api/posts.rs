// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Research community posts.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{
        CreatePostRequest, CreatePostResponse, InteractRequest, MessageResponse, ResearchPost,
    },
    state::AppState,
    storage::{NewPost, PostCategory, PostId, StoreError},
};

/// Maximum post title length, in characters.
pub const MAX_TITLE_LEN: usize = 500;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "Posts",
    security(("bearer" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = CreatePostResponse),
        (status = 400, description = "Invalid post", body = ErrorBody),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody)
    )
)]
pub async fn create_post(
    Auth(researcher): Auth,
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePostResponse>), ApiError> {
    let Json(request) = payload?;

    let (Some(title), Some(content), Some(category)) = (
        non_empty(request.title),
        non_empty(request.content),
        non_empty(request.category),
    ) else {
        return Err(ApiError::bad_request(
            "Title, content, and category are required",
        ));
    };

    let category =
        PostCategory::from_wire(&category).ok_or_else(|| ApiError::bad_request("Invalid category"))?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::bad_request(
            "Title must be at most 500 characters",
        ));
    }

    let tags = request
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    let new_post = NewPost {
        author_id: researcher.researcher_id,
        title,
        content,
        category,
        tags,
        created_at: Utc::now(),
    };

    let post_id = state
        .pool
        .run(move |store| store.create_post(new_post))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create post");
            ApiError::internal("Failed to create post")
        })?;

    tracing::info!(post_id, researcher_id = %researcher.researcher_id, "Research post created");
    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            message: "Post created successfully".to_string(),
            post_id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All posts, newest first", body = [ResearchPost]),
        (status = 401, description = "Access token required", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody)
    )
)]
pub async fn list_posts(
    Auth(_researcher): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ResearchPost>>, ApiError> {
    let posts = state
        .pool
        .run(|store| store.list_posts())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch posts");
            ApiError::internal("Failed to fetch posts")
        })?;

    Ok(Json(posts.into_iter().map(ResearchPost::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{post_id}/interact",
    tag = "Posts",
    security(("bearer" = [])),
    params(
        ("post_id" = u64, Path, description = "Identifier of the post")
    ),
    request_body = InteractRequest,
    responses(
        (status = 200, description = "Interaction recorded", body = MessageResponse),
        (status = 400, description = "Invalid interaction type", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody)
    )
)]
pub async fn interact(
    Auth(_researcher): Auth,
    State(state): State<AppState>,
    post_id: Result<Path<PostId>, PathRejection>,
    payload: Result<Json<InteractRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(post_id) = post_id?;
    let Json(request) = payload?;
    let kind = request
        .interaction()
        .ok_or_else(|| ApiError::bad_request("Invalid interaction type"))?;

    state
        .pool
        .run(move |store| store.record_interaction(post_id, kind))
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::not_found("Post not found"),
            other => {
                tracing::error!(error = %other, post_id, "Failed to update interaction");
                ApiError::internal("Failed to update interaction")
            }
        })?;

    Ok(Json(MessageResponse::new("Interaction recorded successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedResearcher;
    use crate::storage::{NewResearcher, ResearcherStore};

    fn author(state_store: &crate::storage::InMemoryStore) -> AuthenticatedResearcher {
        let id = state_store
            .register_researcher(NewResearcher {
                username: "jane.doe".to_string(),
                password_hash: "x".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        AuthenticatedResearcher {
            researcher_id: id,
            username: "jane.doe".to_string(),
            issued_at: 0,
            expires_at: 0,
        }
    }

    fn post_request(title: &str, category: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: Some(title.to_string()),
            content: Some("Light curve attached".to_string()),
            category: Some(category.to_string()),
            tags: Some(vec!["kepler".to_string(), " ".to_string()]),
        }
    }

    #[tokio::test]
    async fn create_then_list() {
        let (state, store) = AppState::for_tests_with_store();
        let researcher = author(&store);

        let (status, Json(created)) = create_post(
            Auth(researcher.clone()),
            State(state.clone()),
            Ok(Json(post_request("Transit dip", "OBSERVATION"))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.message, "Post created successfully");

        let Json(posts) = list_posts(Auth(researcher), State(state)).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, created.post_id.to_string());
        assert_eq!(posts[0].author.avatar, "JD");
        assert_eq!(posts[0].tags, vec!["kepler".to_string()]);
        assert_eq!(posts[0].category, PostCategory::Observation);
    }

    #[tokio::test]
    async fn create_requires_fields_and_known_category() {
        let (state, store) = AppState::for_tests_with_store();
        let researcher = author(&store);

        let err = create_post(
            Auth(researcher.clone()),
            State(state.clone()),
            Ok(Json(CreatePostRequest::default())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Title, content, and category are required");

        let err = create_post(
            Auth(researcher),
            State(state),
            Ok(Json(post_request("Title", "GOSSIP"))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "Invalid category");
    }

    #[tokio::test]
    async fn interact_bumps_one_counter() {
        let (state, store) = AppState::for_tests_with_store();
        let researcher = author(&store);
        let (_, Json(created)) = create_post(
            Auth(researcher.clone()),
            State(state.clone()),
            Ok(Json(post_request("Model v2", "AI_MODEL"))),
        )
        .await
        .unwrap();

        let Json(ack) = interact(
            Auth(researcher.clone()),
            State(state.clone()),
            Ok(Path(created.post_id)),
            Ok(Json(InteractRequest {
                kind: Some("share".to_string()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(ack.message, "Interaction recorded successfully");

        let Json(posts) = list_posts(Auth(researcher), State(state)).await.unwrap();
        assert_eq!((posts[0].likes, posts[0].comments, posts[0].shares), (0, 0, 1));
    }

    #[tokio::test]
    async fn interact_rejects_bad_type_and_unknown_post() {
        let (state, store) = AppState::for_tests_with_store();
        let researcher = author(&store);

        let err = interact(
            Auth(researcher.clone()),
            State(state.clone()),
            Ok(Path(1)),
            Ok(Json(InteractRequest {
                kind: Some("upvote".to_string()),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid interaction type");

        let err = interact(
            Auth(researcher),
            State(state),
            Ok(Path(999)),
            Ok(Json(InteractRequest {
                kind: Some("like".to_string()),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Post not found");
    }
}
