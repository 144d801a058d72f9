use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use agora_types::models::{Comment, CommentId, User};

use crate::documents::{Document, DocumentStore};
use crate::{RepoError, RepoResult};

impl Document for Comment {
    const COLLECTION: &'static str = "comments";

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct CommentRepo<S> {
    store: S,
}

impl<S: DocumentStore<Comment>> CommentRepo<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn new_comment(&self, author: &User, body: &str) -> RepoResult<CommentId> {
        let comment = Comment {
            id: Uuid::new_v4().simple().to_string(),
            author: author.clone(),
            body: body.to_string(),
            created: Utc::now(),
        };
        self.store.insert(&comment)?;
        Ok(comment.id)
    }

    pub fn get_by_id(&self, id: &str) -> RepoResult<Comment> {
        self.store
            .find_one(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    /// Returns false when the comment was already gone.
    pub fn del_comment(&self, id: &str) -> RepoResult<bool> {
        Ok(self.store.remove(id)?)
    }

    /// Resolve a post's comment ids, in order. Ids whose comment no longer
    /// exists are skipped.
    pub fn expand(&self, ids: &[CommentId]) -> RepoResult<Vec<Comment>> {
        let mut comments = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_by_id(id) {
                Ok(comment) => comments.push(comment),
                Err(RepoError::NotFound(_)) => warn!("Dangling comment id {}", id),
                Err(e) => return Err(e),
            }
        }
        Ok(comments)
    }
}
