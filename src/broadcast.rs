//! In-process fan-out of reload notifications to event stream listeners.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::metrics::{BROADCAST_MESSAGES, SUBSCRIBERS};

/// Message sent to existing listeners when a new one connects, and the default for `/notify`.
pub const RELOAD: &str = "reload";

pub type SubscriberId = u64;

#[derive(Default)]
struct Registry {
    next_id: SubscriberId,
    subscribers: HashMap<SubscriberId, mpsc::UnboundedSender<String>>,
}

impl Registry {
    // Best effort: a subscriber whose channel is closed is dropped from the set.
    fn deliver(&mut self, message: &str) -> usize {
        self.subscribers.retain(|id, tx| match tx.send(message.to_owned()) {
            Ok(()) => true,
            Err(_) => {
                debug!(subscriber = *id, "delivery failed, removing subscriber");
                false
            }
        });
        SUBSCRIBERS.set(self.subscribers.len() as i64);
        self.subscribers.len()
    }
}

/// Shared set of live subscribers. Every mutation happens under one lock, so
/// publishes are observed in the same order by every subscriber.
#[derive(Default)]
pub struct Broadcaster {
    registry: Mutex<Registry>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber after telling the existing ones that a peer arrived.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut registry = self.registry.lock();
        let notified = registry.deliver(RELOAD);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);
        SUBSCRIBERS.set(registry.subscribers.len() as i64);
        drop(registry);

        debug!(subscriber = id, notified, "subscriber connected");

        Subscription {
            id,
            receiver: rx,
            broadcaster: Arc::clone(self),
        }
    }

    /// Deliver `message` to every registered subscriber; returns how many accepted it.
    pub fn publish(&self, message: &str) -> usize {
        BROADCAST_MESSAGES.inc();
        let delivered = self.registry.lock().deliver(message);
        debug!(message, delivered, "published");
        delivered
    }

    /// Returns false when `id` was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut registry = self.registry.lock();
        let removed = registry.subscribers.remove(&id).is_some();
        SUBSCRIBERS.set(registry.subscribers.len() as i64);
        drop(registry);

        if removed {
            debug!(subscriber = id, "subscriber disconnected");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.registry.lock().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every sender so open streams end. Used on shutdown.
    pub fn close_all(&self) -> usize {
        let mut registry = self.registry.lock();
        let closed = registry.subscribers.len();
        registry.subscribers.clear();
        SUBSCRIBERS.set(0);
        closed
    }
}

/// A live registration. Dropping it removes the subscriber from the set.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<String>,
    broadcaster: Arc<Broadcaster>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next message; `None` once the broadcaster has let go of this subscriber.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(self.id);
    }
}
