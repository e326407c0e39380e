//! Server-sent event stream of broadcast events
//!
//! Each connection holds one hub subscription for its lifetime. Frames are
//! `event: <name>` followed by `data: <json>`; idle connections receive a
//! comment line every `keep_alive_seconds` so proxies keep them open. The
//! stream ends when the hub drops the subscriber, either because it fell
//! too far behind or because the server is shutting down. The client then
//! reconnects and refetches.

use std::time::Duration;

use actix_web::{
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    web, HttpResponse,
};
use futures_util::stream::{self, Stream};
use tokio::time::{interval, Interval, MissedTickBehavior};

use cn_core::domain::events::BroadcastEvent;
use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};
use cn_core::services::Subscription;

use crate::app::AppState;

/// Client reconnect delay advertised on connect, in milliseconds
const RETRY_MILLIS: u64 = 3000;

/// GET /api/events
pub async fn stream_events<L, U, P>(state: web::Data<AppState<L, U, P>>) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    let subscription = state.hub.subscribe();
    let keep_alive = Duration::from_secs(state.config.broadcast.keep_alive_seconds.max(1));

    tracing::debug!(subscriber_id = subscription.id(), "Event stream opened");

    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(event_stream(subscription, keep_alive))
}

struct StreamState {
    subscription: Subscription,
    ticker: Interval,
    greeted: bool,
}

fn event_stream(
    subscription: Subscription,
    keep_alive: Duration,
) -> impl Stream<Item = Result<web::Bytes, actix_web::Error>> {
    let mut ticker = interval(keep_alive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let state = StreamState {
        subscription,
        ticker,
        greeted: false,
    };

    stream::unfold(state, |mut state| async move {
        if !state.greeted {
            state.greeted = true;
            // The first tick completes immediately; consume it with the greeting.
            state.ticker.tick().await;
            let hello = web::Bytes::from(format!("retry: {}\n: connected\n\n", RETRY_MILLIS));
            return Some((Ok(hello), state));
        }

        let frame = tokio::select! {
            event = state.subscription.recv() => match event {
                Some(event) => encode_frame(&event),
                None => {
                    tracing::debug!(subscriber_id = state.subscription.id(), "Event stream closed by hub");
                    return None;
                }
            },
            _ = state.ticker.tick() => web::Bytes::from_static(b": keep-alive\n\n"),
        };

        Some((Ok(frame), state))
    })
}

/// Encode one event as an SSE frame
pub fn encode_frame(event: &BroadcastEvent) -> web::Bytes {
    match serde_json::to_string(event) {
        Ok(data) => web::Bytes::from(format!("event: {}\ndata: {}\n\n", event.name(), data)),
        Err(e) => {
            tracing::error!(event = event.name(), "Failed to encode broadcast event: {}", e);
            web::Bytes::from_static(b": dropped\n\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_core::services::EventHub;
    use futures_util::StreamExt;
    use uuid::Uuid;

    #[test]
    fn test_encode_frame() {
        let post_id = Uuid::new_v4();
        let frame = encode_frame(&BroadcastEvent::PostDeleted { post_id });
        let text = std::str::from_utf8(&frame).unwrap();

        assert!(text.starts_with("event: post-deleted\ndata: {"));
        assert!(text.ends_with("\n\n"));
        assert!(text.contains(&post_id.to_string()));
    }

    #[tokio::test]
    async fn test_stream_greets_then_forwards_events() {
        let hub = EventHub::new(8);
        let stream = event_stream(hub.subscribe(), Duration::from_secs(60));
        tokio::pin!(stream);

        let hello = stream.next().await.unwrap().unwrap();
        assert!(hello.starts_with(b"retry: 3000"));

        let post_id = Uuid::new_v4();
        hub.publish(BroadcastEvent::PostDeleted { post_id });
        let frame = stream.next().await.unwrap().unwrap();
        assert!(frame.starts_with(b"event: post-deleted"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_sends_keep_alive_when_idle() {
        let hub = EventHub::new(8);
        let stream = event_stream(hub.subscribe(), Duration::from_secs(15));
        tokio::pin!(stream);

        stream.next().await.unwrap().unwrap();
        let frame = stream.next().await.unwrap().unwrap();
        assert_eq!(&frame[..], b": keep-alive\n\n");
    }

    #[tokio::test]
    async fn test_stream_ends_on_hub_shutdown() {
        let hub = EventHub::new(8);
        let stream = event_stream(hub.subscribe(), Duration::from_secs(60));
        tokio::pin!(stream);

        stream.next().await.unwrap().unwrap();
        hub.shutdown();
        assert!(stream.next().await.is_none());
    }
}
