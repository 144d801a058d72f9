//! HTTP layer of Agora: credential store, session manager, auth middleware
//! and the post/comment handlers.

pub mod auth;
pub mod comments;
pub mod credentials;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;

/// Build the `/api` router. Mutating routes sit behind [`middleware::require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/posts/", get(posts::list_all))
        .route("/api/posts/{category}", get(posts::list_category))
        .route("/api/post/{post_id}", get(posts::get_post))
        .route("/api/user/{username}", get(posts::list_by_user));

    let protected_routes = Router::new()
        .route("/api/posts", post(posts::create_post))
        .route(
            "/api/post/{post_id}",
            post(comments::add_comment).delete(posts::delete_post),
        )
        .route("/api/post/{post_id}/upvote", get(posts::upvote))
        .route("/api/post/{post_id}/downvote", get(posts::downvote))
        .route("/api/post/{post_id}/{comment_id}", delete(comments::delete_comment))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run store access and password hashing on the blocking pool.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state)).await?
}
