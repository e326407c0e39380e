//! Event hub implementation
//!
//! Every subscriber owns a bounded queue. `publish` never waits: it offers
//! the event to each queue and evicts subscribers whose queue is full or
//! whose receiver is gone. An evicted subscriber sees its stream end and is
//! expected to reconnect and refetch.
//!
//! The registry lock is held for the whole fan-out, so concurrent publishes
//! are serialized and every subscriber receives events in publish order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use cn_shared::BroadcastConfig;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::domain::events::BroadcastEvent;

/// Identifier assigned to each subscription
pub type SubscriberId = u64;

type Outbox = mpsc::Sender<Arc<BroadcastEvent>>;

struct HubInner {
    subscribers: Mutex<HashMap<SubscriberId, Outbox>>,
    next_id: AtomicU64,
    buffer: usize,
    closed: AtomicBool,
}

impl HubInner {
    fn remove(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().remove(&id).is_some()
    }
}

/// Handle to the process-wide hub
///
/// Cloning is cheap; all clones share one registry. The hub lives until
/// [`EventHub::shutdown`] is called or the last handle is dropped.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

/// Outcome of a single publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the event was queued for
    pub delivered: usize,
    /// Subscribers evicted during this publish
    pub evicted: usize,
}

impl EventHub {
    /// Create a hub whose subscribers each buffer up to `buffer` events
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_config(config: &BroadcastConfig) -> Self {
        Self::new(config.subscriber_buffer)
    }

    /// Open a live subscription
    ///
    /// Only events published after this call are received. On a hub that
    /// has been shut down the returned subscription is already ended.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.buffer);

        {
            let mut subscribers = self.inner.subscribers.lock();
            if !self.inner.closed.load(Ordering::Acquire) {
                subscribers.insert(id, sender);
                debug!(subscriber_id = id, "Subscriber connected");
            }
        }

        Subscription {
            id,
            receiver,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every current subscriber
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: BroadcastEvent) -> PublishReport {
        let event = Arc::new(event);
        let mut report = PublishReport::default();
        let mut subscribers = self.inner.subscribers.lock();

        subscribers.retain(|id, outbox| match outbox.try_send(Arc::clone(&event)) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(subscriber_id = *id, "Subscriber lagging, disconnecting");
                report.evicted += 1;
                false
            }
            Err(TrySendError::Closed(_)) => {
                report.evicted += 1;
                false
            }
        });

        debug!(
            event = event.name(),
            post_id = %event.post_id(),
            delivered = report.delivered,
            evicted = report.evicted,
            "Event published"
        );
        report
    }

    /// Tear down a subscription by id
    ///
    /// # Returns
    /// * `true` - The subscriber was registered and has been removed
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            debug!(subscriber_id = id, "Subscriber disconnected");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// End every subscription and refuse new ones
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let count = {
            let mut subscribers = self.inner.subscribers.lock();
            let count = subscribers.len();
            subscribers.clear();
            count
        };
        info!(subscribers = count, "Event hub shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

/// Receiving end of a subscription; dropping it unsubscribes
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<BroadcastEvent>>,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event
    ///
    /// Returns `None` once the subscription has been evicted, unsubscribed,
    /// or the hub has shut down.
    pub async fn recv(&mut self) -> Option<Arc<BroadcastEvent>> {
        self.receiver.recv().await
    }

    /// Take an already queued event without waiting
    pub fn try_recv(&mut self) -> Option<Arc<BroadcastEvent>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}
