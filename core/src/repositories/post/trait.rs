//! Post store trait covering posts, likes and comments.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::post::{CommentRecord, PostRecord};
use crate::errors::DomainError;

/// Repository trait for posts and their comments
///
/// Mutations report a missing post through their return value rather than
/// an error so the calling service decides how to surface it.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Store a new post
    async fn create(&self, post: PostRecord) -> Result<PostRecord, DomainError>;

    /// Load a post with its likes and comments
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, DomainError>;

    /// All posts, newest first
    async fn list_recent(&self) -> Result<Vec<PostRecord>, DomainError>;

    /// Replace a post's text and bump `updated_at`
    ///
    /// # Returns
    /// * `Ok(Some(PostRecord))` - The updated post
    /// * `Ok(None)` - No such post
    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<PostRecord>, DomainError>;

    /// Delete a post with its likes and comments
    ///
    /// # Returns
    /// * `Ok(true)` - Post removed
    /// * `Ok(false)` - No such post
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Atomically add or remove `user_id` from the post's likes
    ///
    /// # Returns
    /// * `Ok(Some(likes))` - Likes after the toggle
    /// * `Ok(None)` - No such post
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError>;

    /// Append a comment
    ///
    /// # Returns
    /// * `Ok(true)` - Comment stored
    /// * `Ok(false)` - No such post
    async fn add_comment(&self, post_id: Uuid, comment: CommentRecord) -> Result<bool, DomainError>;

    /// Remove a comment from a post
    ///
    /// # Returns
    /// * `Ok(true)` - Comment removed
    /// * `Ok(false)` - No such post or comment
    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, DomainError>;
}
