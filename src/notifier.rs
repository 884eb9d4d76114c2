//! Per-object publish/subscribe event channels
//!
//! A `Notifier` is a registry of named event channels, each holding an
//! ordered list of subscriber callbacks. Dispatch is asynchronous and
//! non-blocking: `emit` schedules every current subscriber as an independent
//! task and returns immediately, so an event source (such as a transport
//! callback) is never blocked or reentered by application logic, and a
//! failing subscriber cannot prevent the others from running.
//!
//! # Delivery Contract
//!
//! - Subscribers for one `emit` are scheduled in subscription order, but each
//!   runs as its own task; no ordering is guaranteed across different emits.
//! - The subscriber list is snapshotted when `emit` is called: binds and
//!   unbinds that happen afterwards do not affect in-flight deliveries.
//! - `emit` never awaits subscribers and never observes their outcome.
//!
//! # Subscriber Identity
//!
//! `bind` returns a [`SubscriberId`] token; passing it back to [`Notifier::unbind`]
//! removes that subscription. A channel whose last subscriber is removed
//! disappears entirely, so [`Notifier::has_subscribers`] doubles as a
//! membership test.
//!
//! # Examples
//!
//! ```rust
//! use sluice::Notifier;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let notifier: Notifier<String> = Notifier::new();
//!
//! let id = notifier.bind("greeting", |msg| async move {
//!     println!("got: {msg}");
//! }).await;
//!
//! assert!(notifier.emit("greeting", "hello".to_string()).await);
//! assert!(!notifier.emit("unknown", "nobody listens".to_string()).await);
//!
//! notifier.unbind("greeting", id).await;
//! assert!(!notifier.has_subscribers("greeting").await);
//! # }
//! ```

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Type for subscriber callback functions
pub type SubscriberFn<E> = Arc<dyn Fn(E) -> BoxFuture<'static, ()> + Send + Sync>;

/// Identity token for a single subscription, returned by [`Notifier::bind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber<E> {
    id: SubscriberId,
    callback: SubscriberFn<E>,
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Registry of named event channels with asynchronous dispatch
pub struct Notifier<E> {
    channels: Arc<Mutex<HashMap<String, Vec<Subscriber<E>>>>>,
    next_id: Arc<AtomicU64>,
}

impl<E> Clone for Notifier<E> {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Notifier<E> {
    /// Create an empty notifier
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<E: Clone + Send + 'static> Notifier<E> {
    /// Register a callback on the named channel
    ///
    /// Multiple binds on the same channel accumulate in subscription order;
    /// there is no deduplication. The returned token identifies this
    /// subscription for [`unbind`](Self::unbind).
    pub async fn bind<F, Fut>(&self, event: impl Into<String>, callback: F) -> SubscriberId
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: SubscriberFn<E> = Arc::new(move |payload| Box::pin(callback(payload)));

        self.channels
            .lock()
            .await
            .entry(event.into())
            .or_default()
            .push(Subscriber { id, callback });

        id
    }

    /// Remove one subscription from the named channel
    ///
    /// Returns `false` (a no-op) when the channel or the token is unknown.
    /// The channel entry is dropped when its last subscriber goes.
    pub async fn unbind(&self, event: &str, id: SubscriberId) -> bool {
        let mut channels = self.channels.lock().await;
        let Some(subscribers) = channels.get_mut(event) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            channels.remove(event);
        }
        removed
    }

    /// Remove every subscription on the named channel
    pub async fn unbind_all(&self, event: &str) -> bool {
        self.channels.lock().await.remove(event).is_some()
    }

    /// Dispatch a payload to every subscriber currently on the named channel
    ///
    /// Returns `false` without side effects when nobody is subscribed.
    /// Otherwise each subscriber is spawned as an independent task with a
    /// clone of the payload, in subscription order, and `true` is returned
    /// immediately.
    pub async fn emit(&self, event: &str, payload: E) -> bool {
        let snapshot = {
            let channels = self.channels.lock().await;
            match channels.get(event) {
                Some(subscribers) => subscribers.clone(),
                None => return false,
            }
        };

        for subscriber in snapshot {
            let callback = subscriber.callback;
            let payload = payload.clone();
            tokio::spawn(async move {
                callback(payload).await;
            });
        }
        true
    }

    /// Whether the named channel has any subscribers
    pub async fn has_subscribers(&self, event: &str) -> bool {
        self.channels.lock().await.contains_key(event)
    }

    /// Names of all channels that currently have subscribers
    pub async fn channel_names(&self) -> Vec<String> {
        self.channels.lock().await.keys().cloned().collect()
    }
}
