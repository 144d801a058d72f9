use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub type UserId = i64;
pub type SessionId = i64;
pub type PostId = String;
pub type CommentId = String;

/// Public identity of a user. Embedded as the author of posts and comments,
/// so the id travels as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(with = "id_string")]
    pub id: UserId,
    pub username: String,
}

/// An authenticated session, resolved from a bearer token on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user: User,
}

/// Direction of a single vote. Serialized as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    pub fn value(self) -> i64 {
        match self {
            Rating::Up => 1,
            Rating::Down => -1,
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i64::deserialize(deserializer)? {
            1 => Ok(Rating::Up),
            -1 => Ok(Rating::Down),
            other => Err(de::Error::custom(format!("invalid vote value {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "user", with = "id_string")]
    pub user_id: UserId,
    #[serde(rename = "vote")]
    pub rating: Rating,
}

/// Body of a post. The `type` tag selects which of `text` / `url` is present,
/// so a post can never carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PostContent {
    Text { text: String },
    Link { url: String },
}

/// A post document as stored in the `posts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author: User,
    pub category: String,
    pub title: String,
    #[serde(flatten)]
    pub content: PostContent,
    pub created: DateTime<Utc>,
    pub score: i64,
    pub views: u64,
    pub upvote_percentage: u8,
    pub votes: Vec<Vote>,
    /// Ids into the `comments` collection. Weak references: the comment may
    /// already be gone.
    #[serde(rename = "comments")]
    pub comment_ids: Vec<CommentId>,
}

/// A comment document as stored in the `comments` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: User,
    pub body: String,
    pub created: DateTime<Utc>,
}

/// Serde adapter writing integer ids as JSON strings.
pub mod id_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
