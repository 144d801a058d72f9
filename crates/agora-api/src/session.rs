//! Bearer-token sessions.
//!
//! A token is an HS256 JWT naming a row in the `sessions` table. Every check
//! re-reads that row: the row's user id and expiry are authoritative, the
//! token's own `exp` is only a first filter.

use std::sync::Arc;

use axum::{
    Json,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use agora_db::Database;
use agora_types::api::{Claims, ClaimsUser, TokenResponse};
use agora_types::models::{Session, SessionId, User};

/// Lifetime of a session in seconds. Fixed at creation, never extended.
pub const SESSION_TTL: i64 = 600;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no credentials supplied")]
    NoAuth,

    #[error("token signature rejected")]
    BadSignature,

    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("session not found")]
    NoSession,

    #[error("session expired")]
    SessionExpired,

    #[error("token user does not own the session")]
    UserMismatch,

    #[error("store error: {0}")]
    Store(#[from] agora_db::Error),
}

/// Result of a successful login or registration. Responds with
/// `{"token": ...}`.
#[derive(Debug)]
pub struct CreatedSession {
    pub session_id: SessionId,
    pub token: String,
}

impl IntoResponse for CreatedSession {
    fn into_response(self) -> Response {
        Json(TokenResponse { token: self.token }).into_response()
    }
}

pub struct SessionManager {
    db: Arc<Database>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionManager {
    pub fn new(db: Arc<Database>, secret: &str) -> Self {
        Self {
            db,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Open a new session for `user` and sign a token for it.
    pub fn create(&self, user: &User) -> Result<CreatedSession, SessionError> {
        let now = Utc::now().timestamp();
        let expires_at = now + SESSION_TTL;

        let session_id = self.db.create_session(user.id, now, expires_at)?;

        let token = self.sign(&Claims {
            user: ClaimsUser {
                id: user.id.to_string(),
                username: user.username.clone(),
            },
            session_id,
            iat: now,
            exp: expires_at,
        })?;

        info!("Created session {} for {}", session_id, user.username);
        Ok(CreatedSession { session_id, token })
    }

    /// Resolve the session named by the request's `Authorization` header.
    pub fn check(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let token = bearer_token(headers).ok_or(SessionError::NoAuth)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::SessionExpired,
                _ => {
                    debug!("Token rejected: {}", e);
                    SessionError::BadSignature
                }
            })?
            .claims;

        let row = self
            .db
            .get_session(claims.session_id)
            .map_err(|e| {
                warn!("Session lookup for {} failed: {}", claims.session_id, e);
                SessionError::NoSession
            })?
            .ok_or(SessionError::NoSession)?;

        let user_id: i64 = claims
            .user
            .id
            .parse()
            .map_err(|_| SessionError::UserMismatch)?;
        if user_id != row.user_id {
            return Err(SessionError::UserMismatch);
        }
        if row.expires_at < Utc::now().timestamp() {
            return Err(SessionError::SessionExpired);
        }

        Ok(Session {
            id: row.id,
            user: User {
                id: user_id,
                username: claims.user.username,
            },
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, SessionError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(SessionError::Signing)
    }
}

/// Second whitespace-separated field of `Authorization`, whatever the scheme.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().nth(1))
}
