use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Comment, Post, PostContent, PostId, SessionId, User, Vote};

// -- Token claims --

/// Identity embedded in the bearer token. The id is a decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: String,
    pub username: String,
}

/// HS256 token payload. `exp` mirrors the session row but the row stays
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

/// Body of both `/api/register` and `/api/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    pub category: String,
    pub title: String,
    #[serde(flatten)]
    pub content: PostContent,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub comment: String,
}

/// A post with its comment ids expanded into comment objects.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub author: User,
    pub category: String,
    pub comments: Vec<Comment>,
    pub created: DateTime<Utc>,
    pub id: PostId,
    pub score: i64,
    #[serde(flatten)]
    pub content: PostContent,
    pub title: String,
    pub upvote_percentage: u8,
    pub views: u64,
    pub votes: Vec<Vote>,
}

impl PostResponse {
    pub fn new(post: Post, comments: Vec<Comment>) -> Self {
        Self {
            author: post.author,
            category: post.category,
            comments,
            created: post.created,
            id: post.id,
            score: post.score,
            content: post.content,
            title: post.title,
            upvote_percentage: post.upvote_percentage,
            views: post.views,
            votes: post.votes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Errors --

/// One entry of the validation error list returned on registration failures.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub location: &'static str,
    pub param: &'static str,
    pub value: String,
    pub msg: &'static str,
}
