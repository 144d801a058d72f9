//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use agora_db::RepoError;
use agora_types::api::FieldError;

use crate::credentials::CredentialError;
use crate::session::SessionError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Session(SessionError::Signing(e)) => {
                error!("Token signing failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Session(SessionError::Store(e)) => {
                error!("Session store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Session(e) => (StatusCode::UNAUTHORIZED, e.to_string()),

            ApiError::Credentials(CredentialError::UsernameTaken(username)) => {
                let errors = [FieldError {
                    location: "body",
                    param: "username",
                    value: username,
                    msg: "already exists",
                }];
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors })))
                    .into_response();
            }
            ApiError::Credentials(e @ (CredentialError::NoUser | CredentialError::BadPassword)) => {
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            ApiError::Credentials(e) => {
                error!("Credential store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }

            ApiError::Repo(RepoError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("not found: {id}"))
            }
            ApiError::Repo(RepoError::Store(e)) => {
                error!("Document store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }

            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),

            ApiError::Join(e) => {
                error!("spawn_blocking join error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
