//! Post repository and vote engine.
//!
//! Every read-modify-write on a post (votes, comment links, view counter)
//! runs under a per-post lock, so concurrent writers on the same post are
//! serialized instead of overwriting each other. Writers on different posts
//! do not contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use agora_types::models::{CommentId, Post, PostContent, Rating, User, UserId, Vote};

use crate::documents::{Document, DocumentStore, Filter};
use crate::{RepoError, RepoResult};

impl Document for Post {
    const COLLECTION: &'static str = "posts";

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct PostRepo<S> {
    store: S,
    locks: PostLocks,
}

impl<S: DocumentStore<Post>> PostRepo<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: PostLocks::default(),
        }
    }

    pub fn get_all(&self) -> RepoResult<Vec<Post>> {
        Ok(self.store.find(&Filter::All)?)
    }

    pub fn get_category(&self, category: &str) -> RepoResult<Vec<Post>> {
        Ok(self.store.find(&Filter::eq("category", category))?)
    }

    pub fn get_by_author(&self, username: &str) -> RepoResult<Vec<Post>> {
        Ok(self.store.find(&Filter::eq("author.username", username))?)
    }

    pub fn get_by_id(&self, id: &str) -> RepoResult<Post> {
        self.store
            .find_one(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    /// Create a post. The author's own upvote is recorded, so a new post
    /// starts at score 1 and 100%.
    pub fn add(
        &self,
        author: &User,
        category: String,
        title: String,
        content: PostContent,
    ) -> RepoResult<Post> {
        let post = Post {
            id: Uuid::new_v4().simple().to_string(),
            author: author.clone(),
            category,
            title,
            content,
            created: Utc::now(),
            score: 1,
            views: 0,
            upvote_percentage: 100,
            votes: vec![Vote {
                user_id: author.id,
                rating: Rating::Up,
            }],
            comment_ids: Vec::new(),
        };

        self.store.insert(&post)?;
        debug!("Post {} created by {}", post.id, author.username);
        Ok(post)
    }

    pub fn upvote(&self, user: &User, post_id: &str) -> RepoResult<Post> {
        self.vote(user.id, post_id, Rating::Up)
    }

    pub fn downvote(&self, user: &User, post_id: &str) -> RepoResult<Post> {
        self.vote(user.id, post_id, Rating::Down)
    }

    fn vote(&self, user_id: UserId, post_id: &str, rating: Rating) -> RepoResult<Post> {
        self.modify(post_id, |post| cast_vote(post, user_id, rating))
    }

    pub fn add_comment(&self, post_id: &str, comment_id: &str) -> RepoResult<Post> {
        self.modify(post_id, |post| {
            post.comment_ids.push(comment_id.to_string());
            true
        })
    }

    /// Detach the first occurrence of `comment_id`. An id that is not linked
    /// leaves the post untouched.
    pub fn delete_comment(&self, post_id: &str, comment_id: &str) -> RepoResult<Post> {
        self.modify(post_id, |post| detach_comment(&mut post.comment_ids, comment_id))
    }

    pub fn up_views(&self, post_id: &str) -> RepoResult<()> {
        self.modify(post_id, |post| {
            post.views += 1;
            true
        })?;
        Ok(())
    }

    /// Returns false when the post was already gone.
    pub fn delete(&self, post_id: &str) -> RepoResult<bool> {
        Ok(self.store.remove(post_id)?)
    }

    /// Load, mutate and store one post while holding its lock. `apply`
    /// returns whether it changed anything; unchanged posts are not written.
    fn modify<F>(&self, post_id: &str, apply: F) -> RepoResult<Post>
    where
        F: FnOnce(&mut Post) -> bool,
    {
        self.locks.with_lock(post_id, || {
            let mut post = self.get_by_id(post_id)?;
            if apply(&mut post) && !self.store.update(&post)? {
                // Removed between load and write.
                return Err(RepoError::NotFound(post_id.to_string()));
            }
            Ok(post)
        })
    }
}

/// Apply one vote by `user_id`. Returns false when the user already voted
/// in that direction.
fn cast_vote(post: &mut Post, user_id: UserId, rating: Rating) -> bool {
    let mut upvotes = post
        .votes
        .iter()
        .filter(|v| v.rating == Rating::Up)
        .count();

    match post.votes.iter().position(|v| v.user_id == user_id) {
        Some(i) if post.votes[i].rating == rating => return false,
        Some(i) => {
            // Flip: removes the opposite vote and adds this one.
            post.votes[i].rating = rating;
            post.score += 2 * rating.value();
            match rating {
                Rating::Up => upvotes += 1,
                Rating::Down => upvotes -= 1,
            }
        }
        None => {
            post.votes.push(Vote { user_id, rating });
            post.score += rating.value();
            if rating == Rating::Up {
                upvotes += 1;
            }
        }
    }

    post.upvote_percentage = upvote_percentage(upvotes, post.votes.len());
    true
}

fn upvote_percentage(upvotes: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (upvotes * 100 / total) as u8
}

fn detach_comment(ids: &mut Vec<CommentId>, comment_id: &str) -> bool {
    match ids.iter().position(|id| id == comment_id) {
        Some(i) => {
            ids.remove(i);
            true
        }
        None => false,
    }
}

/// Lock table keyed by post id. Entries exist only while some operation
/// holds or waits for them.
#[derive(Default)]
struct PostLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PostLocks {
    fn with_lock<T>(&self, id: &str, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(id.to_string()).or_default())
        };

        let result = {
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table, one here: nobody else is waiting.
        if Arc::strong_count(&entry) == 2 {
            table.remove(id);
        }
        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
