//! Post service implementation

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::post::{
    CommentRecord, CommentView, MediaRef, NewPost, PostRecord, PostView, MAX_MEDIA_PER_POST,
};
use crate::domain::entities::user::AuthorSummary;
use crate::domain::events::BroadcastEvent;
use crate::errors::{DomainError, DomainResult};
use crate::repositories::{PostRepository, UserDirectory};
use crate::services::broadcast::EventHub;

/// Number of lock stripes serializing mutations per post
const POST_LOCK_STRIPES: usize = 64;

/// Striped async locks keyed by post id
///
/// A mutation holds its post's stripe from the store write until the event
/// is published, so events for one post leave the hub in commit order.
struct PostLocks {
    stripes: Vec<Mutex<()>>,
}

impl PostLocks {
    fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    async fn lock(&self, post_id: Uuid) -> MutexGuard<'_, ()> {
        let index = (post_id.as_u128() % self.stripes.len() as u128) as usize;
        self.stripes[index].lock().await
    }
}

/// Post use cases
///
/// Every successful mutation publishes exactly one event on the hub after
/// the store has accepted the write. Publishing never fails the request.
pub struct PostService<P, U>
where
    P: PostRepository,
    U: UserDirectory,
{
    posts: Arc<P>,
    users: Arc<U>,
    hub: EventHub,
    locks: PostLocks,
}

impl<P, U> PostService<P, U>
where
    P: PostRepository,
    U: UserDirectory,
{
    pub fn new(posts: Arc<P>, users: Arc<U>, hub: EventHub) -> Self {
        Self {
            posts,
            users,
            hub,
            locks: PostLocks::new(POST_LOCK_STRIPES),
        }
    }

    /// Create a post and announce it as `post-created`
    ///
    /// # Returns
    ///
    /// * `Ok(PostView)` - The stored post with author details
    /// * `Err(DomainError::Validation)` - Empty text or too many media items
    pub async fn create(&self, author_id: Uuid, text: &str, media: Vec<MediaRef>) -> DomainResult<PostView> {
        let text = required_text(text, "Post text is required")?;
        if media.len() > MAX_MEDIA_PER_POST {
            return Err(DomainError::validation(format!(
                "A post can carry at most {} media items",
                MAX_MEDIA_PER_POST
            )));
        }

        let record = self
            .posts
            .create(PostRecord::new(NewPost {
                author_id,
                text,
                media,
            }))
            .await?;
        let view = self.hydrate_one(record).await?;

        info!(post_id = %view.id, author_id = %author_id, "Post created");
        self.hub.publish(BroadcastEvent::PostCreated { post: view.clone() });
        Ok(view)
    }

    /// All posts, newest first, comments newest first
    pub async fn feed(&self) -> DomainResult<Vec<PostView>> {
        let records = self.posts.list_recent().await?;
        self.hydrate(records).await
    }

    pub async fn get(&self, post_id: Uuid) -> DomainResult<PostView> {
        let record = self.load(post_id).await?;
        self.hydrate_one(record).await
    }

    /// Like or unlike a post and announce the new likes as `post-liked`
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Uuid>)` - Likes after the toggle
    /// * `Err(DomainError::NotFound)` - No such post
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> DomainResult<Vec<Uuid>> {
        let _order = self.locks.lock(post_id).await;
        let likes = self
            .posts
            .toggle_like(post_id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post"))?;

        self.hub.publish(BroadcastEvent::PostLiked {
            post_id,
            likes: likes.clone(),
        });
        Ok(likes)
    }

    /// Add a comment and announce it as `comment-added`
    ///
    /// The text is trimmed and must not be empty.
    pub async fn add_comment(&self, post_id: Uuid, author_id: Uuid, text: &str) -> DomainResult<CommentView> {
        let text = required_text(text, "Comment text is required")?;
        let record = CommentRecord::new(author_id, text);
        let author = self.author(author_id).await?;

        let _order = self.locks.lock(post_id).await;
        if !self.posts.add_comment(post_id, record.clone()).await? {
            return Err(DomainError::not_found("post"));
        }

        let comment = CommentView {
            id: record.id,
            author,
            text: record.text,
            created_at: record.created_at,
        };

        self.hub.publish(BroadcastEvent::CommentAdded {
            post_id,
            comment: comment.clone(),
        });
        Ok(comment)
    }

    /// Delete a comment and announce it as `comment-deleted`
    ///
    /// Allowed for the comment's author and for the post's author.
    pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid, actor: Uuid) -> DomainResult<()> {
        let _order = self.locks.lock(post_id).await;
        let post = self.load(post_id).await?;
        let comment = post
            .comment(comment_id)
            .ok_or_else(|| DomainError::not_found("comment"))?;

        if comment.author_id != actor && post.author_id != actor {
            return Err(DomainError::forbidden("Not authorized to delete this comment"));
        }

        if !self.posts.remove_comment(post_id, comment_id).await? {
            return Err(DomainError::not_found("comment"));
        }

        self.hub.publish(BroadcastEvent::CommentDeleted { post_id, comment_id });
        Ok(())
    }

    /// Replace a post's text and announce it as `post-updated`; author only
    pub async fn edit(&self, post_id: Uuid, actor: Uuid, text: &str) -> DomainResult<PostView> {
        let text = required_text(text, "Post text is required")?;
        let updated = {
            let _order = self.locks.lock(post_id).await;
            let post = self.load(post_id).await?;
            if post.author_id != actor {
                return Err(DomainError::forbidden("Not authorized to edit this post"));
            }

            let updated = self
                .posts
                .update_text(post_id, &text)
                .await?
                .ok_or_else(|| DomainError::not_found("post"))?;

            self.hub.publish(BroadcastEvent::PostUpdated {
                post_id,
                text: updated.text.clone(),
                updated_at: updated.updated_at,
            });
            updated
        };
        self.hydrate_one(updated).await
    }

    /// Delete a post and announce it as `post-deleted`; author only
    pub async fn delete(&self, post_id: Uuid, actor: Uuid) -> DomainResult<()> {
        let _order = self.locks.lock(post_id).await;
        let post = self.load(post_id).await?;
        if post.author_id != actor {
            return Err(DomainError::forbidden("Not authorized to delete this post"));
        }

        if !self.posts.delete(post_id).await? {
            return Err(DomainError::not_found("post"));
        }

        info!(post_id = %post_id, "Post deleted");
        self.hub.publish(BroadcastEvent::PostDeleted { post_id });
        Ok(())
    }

    async fn load(&self, post_id: Uuid) -> DomainResult<PostRecord> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post"))
    }

    async fn author(&self, user_id: Uuid) -> DomainResult<AuthorSummary> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await?
            .map(|u| u.author())
            .unwrap_or_else(|| AuthorSummary::unknown(user_id)))
    }

    async fn hydrate_one(&self, record: PostRecord) -> DomainResult<PostView> {
        let mut views = self.hydrate(vec![record]).await?;
        views.pop().ok_or_else(|| DomainError::internal("hydration lost a post"))
    }

    async fn hydrate(&self, records: Vec<PostRecord>) -> DomainResult<Vec<PostView>> {
        let mut ids: Vec<Uuid> = records.iter().flat_map(|r| r.author_ids()).collect();
        ids.sort();
        ids.dedup();

        let authors: HashMap<Uuid, AuthorSummary> = self
            .users
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.author()))
            .collect();

        Ok(records
            .into_iter()
            .map(|record| {
                PostView::from_record(record, |id| {
                    authors.get(&id).cloned().unwrap_or_else(|| AuthorSummary::unknown(id))
                })
            })
            .collect())
    }
}

fn required_text(text: &str, message: &str) -> DomainResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(message));
    }
    Ok(trimmed.to_string())
}
