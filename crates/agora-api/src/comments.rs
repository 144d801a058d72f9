use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use agora_db::RepoError;
use agora_types::api::AddCommentRequest;
use agora_types::models::Session;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::posts::{parse_id, respond};

/// POST /api/post/{post_id}
pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&post_id)?;
    if req.comment.trim().is_empty() {
        return Err(ApiError::BadRequest("comment is required".into()));
    }

    let post = blocking(&state, move |state| {
        let comment_id = state.comments.new_comment(&session.user, &req.comment)?;
        let post = match state.posts.add_comment(&post_id, &comment_id) {
            Ok(post) => post,
            Err(e) => {
                // Don't leave an unreachable comment behind.
                if let Err(cleanup) = state.comments.del_comment(&comment_id) {
                    warn!("Failed to drop orphaned comment {}: {}", comment_id, cleanup);
                }
                return Err(e.into());
            }
        };
        info!("Post {} got comment {} from {}", post.id, comment_id, session.user.username);
        respond(state, post)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// DELETE /api/post/{post_id}/{comment_id}
///
/// The comment must be linked to the post named in the path.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    parse_id(&post_id)?;
    parse_id(&comment_id)?;

    let post = blocking(&state, move |state| {
        let post = state.posts.get_by_id(&post_id)?;
        if !post.comment_ids.contains(&comment_id) {
            return Err(RepoError::NotFound(comment_id).into());
        }

        if !state.comments.del_comment(&comment_id)? {
            warn!("Post {} linked missing comment {}", post_id, comment_id);
        }
        let post = state.posts.delete_comment(&post_id, &comment_id)?;

        info!("Post {} lost comment {} ({})", post.id, comment_id, session.user.username);
        respond(state, post)
    })
    .await?;

    Ok(Json(post))
}
