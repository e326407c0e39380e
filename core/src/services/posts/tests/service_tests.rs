use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::post::{CommentRecord, MediaRef, PostRecord};
use crate::domain::entities::user::User;
use crate::domain::events::BroadcastEvent;
use crate::errors::DomainError;
use crate::repositories::{MockPostRepository, MockUserDirectory, PostRepository};
use crate::services::broadcast::{EventHub, Subscription};
use crate::services::posts::PostService;

struct Fixture {
    service: PostService<MockPostRepository, MockUserDirectory>,
    events: Subscription,
    alice: User,
    bob: User,
}

async fn fixture() -> Fixture {
    let users = Arc::new(MockUserDirectory::new());
    let alice = users.seed("Alice", "alice@x.com", "secret1").await;
    let bob = users.seed("Bob", "bob@x.com", "secret1").await;
    let hub = EventHub::new(32);
    let events = hub.subscribe();
    let service = PostService::new(Arc::new(MockPostRepository::new()), users, hub);

    Fixture {
        service,
        events,
        alice,
        bob,
    }
}

#[tokio::test]
async fn test_create_publishes_hydrated_post() {
    let mut f = fixture().await;

    let post = f.service.create(f.alice.id, "  hello  ", vec![]).await.unwrap();
    assert_eq!(post.text, "hello");
    assert_eq!(post.author.name, "Alice");

    match &*f.events.recv().await.unwrap() {
        BroadcastEvent::PostCreated { post: published } => assert_eq!(published, &post),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_create_validates_text_and_media() {
    let f = fixture().await;

    let err = f.service.create(f.alice.id, "   ", vec![]).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let media = (0..5)
        .map(|i| MediaRef {
            url: format!("https://cdn.example.com/{}.png", i),
            media_type: "image".to_string(),
        })
        .collect();
    let err = f.service.create(f.alice.id, "pics", media).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn test_like_toggle_publishes_likes() {
    let mut f = fixture().await;
    let post = f.service.create(f.alice.id, "hello", vec![]).await.unwrap();
    f.events.recv().await;

    let likes = f.service.toggle_like(post.id, f.bob.id).await.unwrap();
    assert_eq!(likes, vec![f.bob.id]);
    assert_eq!(
        *f.events.recv().await.unwrap(),
        BroadcastEvent::PostLiked {
            post_id: post.id,
            likes: vec![f.bob.id]
        }
    );

    let likes = f.service.toggle_like(post.id, f.bob.id).await.unwrap();
    assert!(likes.is_empty());
}

#[tokio::test]
async fn test_like_missing_post_is_not_found() {
    let f = fixture().await;
    let err = f.service.toggle_like(Uuid::new_v4(), f.bob.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_comment_lifecycle_and_authorization() {
    let mut f = fixture().await;
    let post = f.service.create(f.alice.id, "hello", vec![]).await.unwrap();
    f.events.recv().await;

    let comment = f.service.add_comment(post.id, f.bob.id, " nice ").await.unwrap();
    assert_eq!(comment.text, "nice");
    assert_eq!(comment.author.name, "Bob");
    assert!(matches!(
        &*f.events.recv().await.unwrap(),
        BroadcastEvent::CommentAdded { comment: c, .. } if c.id == comment.id
    ));

    // A third party cannot delete it.
    let stranger = Uuid::new_v4();
    let err = f.service.delete_comment(post.id, comment.id, stranger).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    // The post author can.
    f.service.delete_comment(post.id, comment.id, f.alice.id).await.unwrap();
    assert_eq!(
        *f.events.recv().await.unwrap(),
        BroadcastEvent::CommentDeleted {
            post_id: post.id,
            comment_id: comment.id
        }
    );
    assert!(f.service.get(post.id).await.unwrap().comments.is_empty());
}

#[tokio::test]
async fn test_empty_comment_rejected() {
    let f = fixture().await;
    let post = f.service.create(f.alice.id, "hello", vec![]).await.unwrap();
    let err = f.service.add_comment(post.id, f.bob.id, "  ").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn test_edit_and_delete_are_author_only() {
    let mut f = fixture().await;
    let post = f.service.create(f.alice.id, "hello", vec![]).await.unwrap();
    f.events.recv().await;

    let err = f.service.edit(post.id, f.bob.id, "hijack").await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
    let err = f.service.delete(post.id, f.bob.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    let edited = f.service.edit(post.id, f.alice.id, "hello again").await.unwrap();
    assert_eq!(edited.text, "hello again");
    match &*f.events.recv().await.unwrap() {
        BroadcastEvent::PostUpdated { post_id, text, updated_at } => {
            assert_eq!(*post_id, post.id);
            assert_eq!(text, "hello again");
            assert_eq!(*updated_at, edited.updated_at);
        }
        other => panic!("unexpected event {:?}", other),
    }

    f.service.delete(post.id, f.alice.id).await.unwrap();
    assert_eq!(
        *f.events.recv().await.unwrap(),
        BroadcastEvent::PostDeleted { post_id: post.id }
    );
    assert!(f.service.feed().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_writes_publish_nothing() {
    let mut f = fixture().await;
    let _ = f.service.delete(Uuid::new_v4(), f.alice.id).await;
    let _ = f.service.add_comment(Uuid::new_v4(), f.alice.id, "hi").await;
    assert!(f.events.try_recv().is_none());
}

/// Store that stalls after committing one user's like toggle
struct StallingPosts {
    inner: MockPostRepository,
    slow_liker: Uuid,
}

#[async_trait]
impl PostRepository for StallingPosts {
    async fn create(&self, post: PostRecord) -> Result<PostRecord, DomainError> {
        self.inner.create(post).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn list_recent(&self) -> Result<Vec<PostRecord>, DomainError> {
        self.inner.list_recent().await
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<PostRecord>, DomainError> {
        self.inner.update_text(id, text).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        self.inner.delete(id).await
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, DomainError> {
        let likes = self.inner.toggle_like(id, user_id).await?;
        if user_id == self.slow_liker {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(likes)
    }

    async fn add_comment(&self, post_id: Uuid, comment: CommentRecord) -> Result<bool, DomainError> {
        self.inner.add_comment(post_id, comment).await
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, DomainError> {
        self.inner.remove_comment(post_id, comment_id).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_likes_publish_in_commit_order() {
    let users = Arc::new(MockUserDirectory::new());
    let alice = users.seed("Alice", "alice@x.com", "secret1").await;
    let bob = users.seed("Bob", "bob@x.com", "secret1").await;
    let hub = EventHub::new(32);
    let mut events = hub.subscribe();
    let posts = StallingPosts {
        inner: MockPostRepository::new(),
        slow_liker: alice.id,
    };
    let service = PostService::new(Arc::new(posts), users, hub);

    let post = service.create(alice.id, "hello", vec![]).await.unwrap();
    events.recv().await;

    let (first, second) = tokio::join!(service.toggle_like(post.id, alice.id), service.toggle_like(post.id, bob.id));
    first.unwrap();
    second.unwrap();

    let mut last_likes = None;
    while let Some(event) = events.try_recv() {
        if let BroadcastEvent::PostLiked { likes, .. } = &*event {
            last_likes = Some(likes.clone());
        }
    }

    let stored = service.get(post.id).await.unwrap().likes;
    assert_eq!(stored.len(), 2);
    assert_eq!(last_likes, Some(stored));
}
