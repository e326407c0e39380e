use uuid::Uuid;

use crate::domain::events::BroadcastEvent;
use crate::services::broadcast::EventHub;

fn deleted(post_id: Uuid) -> BroadcastEvent {
    BroadcastEvent::PostDeleted { post_id }
}

fn liked(post_id: Uuid, n: usize) -> BroadcastEvent {
    BroadcastEvent::PostLiked {
        post_id,
        likes: (0..n).map(|_| Uuid::new_v4()).collect(),
    }
}

#[tokio::test]
async fn test_publish_reaches_every_subscriber() {
    let hub = EventHub::new(8);
    let mut a = hub.subscribe();
    let mut b = hub.subscribe();
    let post_id = Uuid::new_v4();

    let report = hub.publish(deleted(post_id));
    assert_eq!(report.delivered, 2);

    assert_eq!(*a.recv().await.unwrap(), deleted(post_id));
    assert_eq!(*b.recv().await.unwrap(), deleted(post_id));
}

#[tokio::test]
async fn test_publish_without_subscribers_is_fine() {
    let hub = EventHub::new(8);
    let report = hub.publish(deleted(Uuid::new_v4()));
    assert_eq!(report.delivered, 0);
    assert_eq!(report.evicted, 0);
}

#[tokio::test]
async fn test_late_subscriber_misses_earlier_events() {
    let hub = EventHub::new(8);
    hub.publish(deleted(Uuid::new_v4()));

    let mut late = hub.subscribe();
    assert!(late.try_recv().is_none());
}

#[tokio::test]
async fn test_events_for_same_post_arrive_in_publish_order() {
    let hub = EventHub::new(16);
    let mut sub = hub.subscribe();
    let post_id = Uuid::new_v4();

    for n in 0..10 {
        hub.publish(liked(post_id, n));
    }
    for n in 0..10 {
        match &*sub.recv().await.unwrap() {
            BroadcastEvent::PostLiked { likes, .. } => assert_eq!(likes.len(), n),
            other => panic!("unexpected event {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_lagging_subscriber_is_evicted_without_affecting_others() {
    let hub = EventHub::new(2);
    let mut slow = hub.subscribe();
    let mut fast = hub.subscribe();
    let post_id = Uuid::new_v4();

    hub.publish(liked(post_id, 1));
    assert!(fast.recv().await.is_some());
    hub.publish(liked(post_id, 2));
    assert!(fast.recv().await.is_some());

    // slow still holds two queued events; the third overflows it.
    let report = hub.publish(liked(post_id, 3));
    assert_eq!(report.delivered, 1);
    assert_eq!(report.evicted, 1);
    assert!(fast.recv().await.is_some());
    assert_eq!(hub.subscriber_count(), 1);

    // The evicted subscriber drains what it had, then sees the end.
    assert!(slow.recv().await.is_some());
    assert!(slow.recv().await.is_some());
    assert!(slow.recv().await.is_none());
}

#[tokio::test]
async fn test_drop_and_unsubscribe_remove_subscribers() {
    let hub = EventHub::new(4);
    let a = hub.subscribe();
    let b = hub.subscribe();
    assert_eq!(hub.subscriber_count(), 2);

    drop(a);
    assert_eq!(hub.subscriber_count(), 1);

    assert!(hub.unsubscribe(b.id()));
    assert!(!hub.unsubscribe(b.id()));
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test]
async fn test_shutdown_ends_streams_and_refuses_new_subscribers() {
    let hub = EventHub::new(4);
    let mut sub = hub.subscribe();

    hub.shutdown();
    assert!(hub.is_shut_down());
    assert!(sub.recv().await.is_none());

    let mut late = hub.subscribe();
    assert_eq!(hub.subscriber_count(), 0);
    assert!(late.recv().await.is_none());
}
