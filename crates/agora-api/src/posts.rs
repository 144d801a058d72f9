use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use agora_types::api::{MessageResponse, NewPostRequest, PostResponse};
use agora_types::models::{Post, Session};

use crate::auth::{AppState, AppStateInner};
use crate::blocking;
use crate::error::ApiError;

/// Post and comment ids are 32 lowercase hex digits.
pub(crate) fn parse_id(raw: &str) -> Result<&str, ApiError> {
    if raw.len() == 32 && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(raw)
    } else {
        Err(ApiError::BadRequest(format!("bad id: {raw}")))
    }
}

/// Expand comment ids into comment objects for the response.
pub(crate) fn respond(state: &AppStateInner, post: Post) -> Result<PostResponse, ApiError> {
    let comments = state.comments.expand(&post.comment_ids)?;
    Ok(PostResponse::new(post, comments))
}

fn respond_all(state: &AppStateInner, posts: Vec<Post>) -> Result<Vec<PostResponse>, ApiError> {
    posts.into_iter().map(|post| respond(state, post)).collect()
}

/// GET /api/posts/
pub async fn list_all(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = blocking(&state, |state| {
        let posts = state.posts.get_all()?;
        respond_all(state, posts)
    })
    .await?;
    Ok(Json(posts))
}

/// GET /api/posts/{category}
pub async fn list_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = blocking(&state, move |state| {
        let posts = state.posts.get_category(&category)?;
        respond_all(state, posts)
    })
    .await?;
    Ok(Json(posts))
}

/// GET /api/user/{username}
pub async fn list_by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = blocking(&state, move |state| {
        let posts = state.posts.get_by_author(&username)?;
        respond_all(state, posts)
    })
    .await?;
    Ok(Json(posts))
}

/// GET /api/post/{post_id} — also counts the view.
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&post_id)?;
    let post = blocking(&state, move |state| {
        state.posts.up_views(&post_id)?;
        let post = state.posts.get_by_id(&post_id)?;
        respond(state, post)
    })
    .await?;
    Ok(Json(post))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<NewPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() || req.category.trim().is_empty() {
        return Err(ApiError::BadRequest("title and category are required".into()));
    }

    let post = blocking(&state, move |state| {
        let post = state
            .posts
            .add(&session.user, req.category, req.title, req.content)?;
        info!("New post {} by {}", post.id, session.user.username);
        respond(state, post)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/post/{post_id}/upvote
pub async fn upvote(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&post_id)?;
    let post = blocking(&state, move |state| {
        let post = state.posts.upvote(&session.user, &post_id)?;
        respond(state, post)
    })
    .await?;
    Ok(Json(post))
}

/// GET /api/post/{post_id}/downvote
pub async fn downvote(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&post_id)?;
    let post = blocking(&state, move |state| {
        let post = state.posts.downvote(&session.user, &post_id)?;
        respond(state, post)
    })
    .await?;
    Ok(Json(post))
}

/// DELETE /api/post/{post_id}
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&post_id)?;
    let id = post_id.clone();
    let deleted = blocking(&state, move |state| Ok(state.posts.delete(&id)?)).await?;
    info!(
        "Delete of post {} by {}: {}",
        post_id,
        session.user.username,
        if deleted { "removed" } else { "already gone" }
    );

    let message = if deleted { "success" } else { "failure" };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}
