//! Local feed state and broadcast reconciliation
//!
//! [`reconcile`] is a pure function from the current feed and one broadcast
//! event to the next feed. Identifiers are kept as strings so optimistic
//! entries can carry a `temp-` placeholder until the server confirms them.
//!
//! Rules:
//! - `post-created` from the viewer is a self-echo and is ignored; the
//!   viewer's own post enters the feed from the create response.
//! - `post-liked` and `post-updated` overwrite the mutable fields (last write wins).
//! - `comment-added` replaces a pending comment with the same text and
//!   author, and is otherwise prepended once.
//! - Deletions remove by id and tolerate absence.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cn_core::domain::entities::post::{CommentView, MediaRef, PostView};
use cn_core::domain::entities::user::AuthorSummary;
use cn_core::domain::events::BroadcastEvent;

/// Prefix of identifiers assigned to optimistic entries
pub const TEMP_ID_PREFIX: &str = "temp-";

fn temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4())
}

/// Comment as held by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedComment {
    pub id: String,
    pub author: AuthorSummary,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl FeedComment {
    /// Not yet confirmed by the server
    pub fn is_pending(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

impl From<CommentView> for FeedComment {
    fn from(comment: CommentView) -> Self {
        Self {
            id: comment.id.to_string(),
            author: comment.author,
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

/// Post as held by the client; comments newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPost {
    pub id: String,
    pub author: AuthorSummary,
    pub text: String,
    pub media: Vec<MediaRef>,
    pub likes: Vec<String>,
    pub comments: Vec<FeedComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedPost {
    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        let user_id = user_id.to_string();
        self.likes.iter().any(|id| *id == user_id)
    }
}

impl From<PostView> for FeedPost {
    fn from(post: PostView) -> Self {
        Self {
            id: post.id.to_string(),
            author: post.author,
            text: post.text,
            media: post.media,
            likes: post.likes.iter().map(Uuid::to_string).collect(),
            comments: post.comments.into_iter().map(FeedComment::from).collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Feed as seen by one viewer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    /// Signed-in user, used for self-echo suppression
    pub viewer: Option<Uuid>,
    /// Newest first
    pub posts: Vec<FeedPost>,
}

impl FeedState {
    pub fn new(viewer: Option<Uuid>) -> Self {
        Self {
            viewer,
            posts: Vec::new(),
        }
    }

    /// Replace the feed with a full fetch
    pub fn load(viewer: Option<Uuid>, posts: Vec<PostView>) -> Self {
        Self {
            viewer,
            posts: posts.into_iter().map(FeedPost::from).collect(),
        }
    }

    pub fn post(&self, post_id: &str) -> Option<&FeedPost> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    fn post_mut(&mut self, post_id: &str) -> Option<&mut FeedPost> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    /// Insert the viewer's own post from the create response
    pub fn insert_own_post(&mut self, post: PostView) {
        let post = FeedPost::from(post);
        if self.post(&post.id).is_none() {
            self.posts.insert(0, post);
        }
    }

    /// Flip `user_id`'s like before the server answers
    pub fn toggle_like_locally(&mut self, post_id: &str, user_id: Uuid) {
        let user_id = user_id.to_string();
        if let Some(post) = self.post_mut(post_id) {
            if let Some(index) = post.likes.iter().position(|id| *id == user_id) {
                post.likes.remove(index);
            } else {
                post.likes.push(user_id);
            }
        }
    }

    /// Overwrite likes with the server's list
    pub fn set_likes(&mut self, post_id: &str, likes: &[Uuid]) {
        if let Some(post) = self.post_mut(post_id) {
            post.likes = likes.iter().map(Uuid::to_string).collect();
        }
    }

    pub fn edit_text_locally(&mut self, post_id: &str, text: &str) {
        if let Some(post) = self.post_mut(post_id) {
            post.text = text.to_string();
        }
    }

    /// Remove a post; returns whether it was present
    pub fn remove_post(&mut self, post_id: &str) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != post_id);
        self.posts.len() != before
    }

    /// Show a comment before the server confirms it
    ///
    /// Returns the placeholder id, or `None` if the post is not in the feed.
    pub fn add_pending_comment(&mut self, post_id: &str, author: AuthorSummary, text: &str) -> Option<String> {
        let post = self.post_mut(post_id)?;
        let id = temp_id();
        post.comments.insert(
            0,
            FeedComment {
                id: id.clone(),
                author,
                text: text.trim().to_string(),
                created_at: Utc::now(),
            },
        );
        Some(id)
    }

    /// Swap a placeholder for the confirmed comment
    ///
    /// If the broadcast already delivered the comment, the placeholder is
    /// simply dropped.
    pub fn confirm_comment(&mut self, post_id: &str, temp_id: &str, comment: CommentView) {
        let Some(post) = self.post_mut(post_id) else {
            return;
        };
        let confirmed = FeedComment::from(comment);

        if post.comments.iter().any(|c| c.id == confirmed.id) {
            post.comments.retain(|c| c.id != temp_id);
        } else if let Some(slot) = post.comments.iter_mut().find(|c| c.id == temp_id) {
            *slot = confirmed;
        } else {
            post.comments.insert(0, confirmed);
        }
    }

    /// Drop every placeholder on a post after a failed write
    pub fn discard_pending_comments(&mut self, post_id: &str) {
        if let Some(post) = self.post_mut(post_id) {
            post.comments.retain(|c| !c.is_pending());
        }
    }
}

/// Apply one broadcast event to `state`
pub fn reconcile(mut state: FeedState, event: &BroadcastEvent) -> FeedState {
    match event {
        BroadcastEvent::PostCreated { post } => {
            let own = state.viewer == Some(post.author.id);
            let known = state.post(&post.id.to_string()).is_some();
            if !own && !known {
                state.posts.insert(0, FeedPost::from(post.clone()));
            }
        }
        BroadcastEvent::PostLiked { post_id, likes } => {
            state.set_likes(&post_id.to_string(), likes);
        }
        BroadcastEvent::PostUpdated {
            post_id,
            text,
            updated_at,
        } => {
            if let Some(post) = state.post_mut(&post_id.to_string()) {
                post.text = text.clone();
                post.updated_at = *updated_at;
            }
        }
        BroadcastEvent::PostDeleted { post_id } => {
            state.remove_post(&post_id.to_string());
        }
        BroadcastEvent::CommentAdded { post_id, comment } => {
            if let Some(post) = state.post_mut(&post_id.to_string()) {
                merge_comment(post, FeedComment::from(comment.clone()));
            }
        }
        BroadcastEvent::CommentDeleted { post_id, comment_id } => {
            if let Some(post) = state.post_mut(&post_id.to_string()) {
                let comment_id = comment_id.to_string();
                post.comments.retain(|c| c.id != comment_id);
            }
        }
    }
    state
}

fn merge_comment(post: &mut FeedPost, confirmed: FeedComment) {
    if post.comments.iter().any(|c| c.id == confirmed.id) {
        return;
    }

    let placeholder = post.comments.iter_mut().find(|c| {
        c.is_pending() && c.text == confirmed.text && c.author.id == confirmed.author.id
    });
    match placeholder {
        Some(slot) => *slot = confirmed,
        None => post.comments.insert(0, confirmed),
    }
}
