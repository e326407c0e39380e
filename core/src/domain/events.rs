//! Broadcast events published after successful writes.
//!
//! Events carry only what a client needs to patch its local feed. They are
//! not persisted; a client that is disconnected when one is published
//! relies on its next full fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::{CommentView, PostView};

/// Tagged union of every real-time notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BroadcastEvent {
    PostCreated {
        post: PostView,
    },
    PostLiked {
        post_id: Uuid,
        likes: Vec<Uuid>,
    },
    PostUpdated {
        post_id: Uuid,
        text: String,
        updated_at: DateTime<Utc>,
    },
    PostDeleted {
        post_id: Uuid,
    },
    CommentAdded {
        post_id: Uuid,
        comment: CommentView,
    },
    CommentDeleted {
        post_id: Uuid,
        comment_id: Uuid,
    },
}

impl BroadcastEvent {
    /// Wire name of the event, used as the SSE `event:` field
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::PostCreated { .. } => "post-created",
            BroadcastEvent::PostLiked { .. } => "post-liked",
            BroadcastEvent::PostUpdated { .. } => "post-updated",
            BroadcastEvent::PostDeleted { .. } => "post-deleted",
            BroadcastEvent::CommentAdded { .. } => "comment-added",
            BroadcastEvent::CommentDeleted { .. } => "comment-deleted",
        }
    }

    /// The post this event concerns
    pub fn post_id(&self) -> Uuid {
        match self {
            BroadcastEvent::PostCreated { post } => post.id,
            BroadcastEvent::PostLiked { post_id, .. }
            | BroadcastEvent::PostUpdated { post_id, .. }
            | BroadcastEvent::PostDeleted { post_id }
            | BroadcastEvent::CommentAdded { post_id, .. }
            | BroadcastEvent::CommentDeleted { post_id, .. } => *post_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tag_matches_name() {
        let event = BroadcastEvent::PostDeleted {
            post_id: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        assert_eq!(json["post_id"], event.post_id().to_string());
    }

    #[test]
    fn test_decode_comment_deleted() {
        let post_id = Uuid::new_v4();
        let comment_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"type":"comment-deleted","post_id":"{}","comment_id":"{}"}}"#,
            post_id, comment_id
        );
        let event: BroadcastEvent = serde_json::from_str(&raw).unwrap();
        assert_eq!(event, BroadcastEvent::CommentDeleted { post_id, comment_id });
    }
}
