//! Post and comment entities.
//!
//! Records hold author ids as persisted; views carry the author summary
//! so a client can render them without further lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::AuthorSummary;

/// Upper bound on media attachments per post
pub const MAX_MEDIA_PER_POST: usize = 4;

/// Reference to an already uploaded media object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    /// `image` or `video`
    #[serde(rename = "type")]
    pub media_type: String,
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub media: Vec<MediaRef>,
}

/// Persisted comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRecord {
    pub fn new(author_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Persisted post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub media: Vec<MediaRef>,
    /// Ids of users who liked the post, in like order
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRecord {
    pub fn new(new_post: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            text: new_post.text,
            media: new_post.media,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add or remove `user_id` from the likes; returns whether the post is now liked
    pub fn toggle_like(&mut self, user_id: Uuid) -> bool {
        if let Some(pos) = self.likes.iter().position(|id| *id == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id);
            true
        }
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&CommentRecord> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Every author id referenced by the post or its comments
    pub fn author_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.author_id];
        for comment in &self.comments {
            if !ids.contains(&comment.author_id) {
                ids.push(comment.author_id);
            }
        }
        ids
    }
}

/// Comment as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post as sent to clients; comments are newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: AuthorSummary,
    pub text: String,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub likes: Vec<Uuid>,
    #[serde(default)]
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    /// Hydrate `record` using `lookup` to resolve author ids
    pub fn from_record<F>(record: PostRecord, lookup: F) -> Self
    where
        F: Fn(Uuid) -> AuthorSummary,
    {
        let mut comments: Vec<CommentView> = record
            .comments
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                author: lookup(c.author_id),
                text: c.text,
                created_at: c.created_at,
            })
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            id: record.id,
            author: lookup(record.author_id),
            text: record.text,
            media: record.media,
            likes: record.likes,
            comments,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
