use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use cn_core::domain::entities::post::{CommentRecord, PostRecord};
use cn_core::errors::DomainError;
use cn_core::repositories::PostRepository;

/// Posts kept in memory
///
/// Like toggles and comment edits happen under the write lock, so two
/// concurrent toggles by different users both land.
#[derive(Clone, Default)]
pub struct InMemoryPostRepository {
    posts: Arc<RwLock<HashMap<Uuid, PostRecord>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: PostRecord) -> Result<PostRecord, DomainError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(DomainError::internal(format!("Post {} already exists", post.id)));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, DomainError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<PostRecord>, DomainError> {
        let mut posts: Vec<PostRecord> = self.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<PostRecord>, DomainError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        post.text = text.to_string();
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        post.toggle_like(user_id);
        Ok(Some(post.likes.clone()))
    }

    async fn add_comment(&self, post_id: Uuid, comment: CommentRecord) -> Result<bool, DomainError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(false);
        };
        post.comments.push(comment);
        Ok(true)
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, DomainError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(false);
        };
        let before = post.comments.len();
        post.comments.retain(|c| c.id != comment_id);
        Ok(post.comments.len() != before)
    }
}
