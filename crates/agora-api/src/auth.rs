use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use agora_db::Database;
use agora_db::comments::CommentRepo;
use agora_db::posts::PostRepo;
use agora_types::api::CredentialsRequest;
use agora_types::models::User;

use crate::blocking;
use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::session::SessionManager;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub posts: PostRepo<Arc<Database>>,
    pub comments: CommentRepo<Arc<Database>>,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, jwt_secret: &str) -> Self {
        Self {
            credentials: CredentialStore::new(Arc::clone(&db)),
            sessions: SessionManager::new(Arc::clone(&db), jwt_secret),
            posts: PostRepo::new(Arc::clone(&db)),
            comments: CommentRepo::new(db),
        }
    }
}

fn validate(req: &CredentialsRequest) -> Result<(), ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username is required".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password is required".into()));
    }
    Ok(())
}

/// POST /api/register — create the account and log it in.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let created = blocking(&state, move |state| {
        let user_id = state.credentials.register(&req.username, &req.password)?;
        let user = User {
            id: user_id,
            username: req.username,
        };
        Ok(state.sessions.create(&user)?)
    })
    .await?;

    Ok((StatusCode::CREATED, created))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    blocking(&state, move |state| {
        let user = state
            .credentials
            .authorize(&req.username, &req.password)
            .inspect_err(|e| info!("Login failed for {}: {}", req.username, e))?;
        Ok(state.sessions.create(&user)?)
    })
    .await
}
