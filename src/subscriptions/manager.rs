//! Registry mapping event keys to ordered subscriber lists.

use crate::error::Result;
use crate::scheduler::Scheduler;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use super::types::{Handler, Subscription};

struct Inner<K, P> {
    /// Subscribers by key, in registration order. Keys are created on first
    /// reference and kept even when their list becomes empty.
    subscriptions: RwLock<HashMap<K, Vec<Subscription<P>>>>,
    /// Runs deferred publishes.
    scheduler: Arc<dyn Scheduler>,
}

/// Keyed registry of handlers.
///
/// Cloning is cheap and every clone addresses the same registry, so handlers
/// can capture a clone and subscribe, unsubscribe or publish from inside a
/// delivery. No lock is held while handlers run.
pub struct Registry<K, P> {
    inner: Arc<Inner<K, P>>,
}

impl<K, P> Registry<K, P>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    /// Create a registry that defers publishes onto `scheduler`.
    pub fn new<S>(scheduler: S) -> Self
    where
        S: Scheduler + 'static,
    {
        Self::with_scheduler(Arc::new(scheduler))
    }

    /// Create a registry over a scheduler shared with other registries.
    ///
    /// Deferred publishes from every registry on the same scheduler run in
    /// one FIFO order.
    pub fn with_scheduler(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                subscriptions: RwLock::new(HashMap::new()),
                scheduler,
            }),
        }
    }

    /// Append a handler to `key`'s subscribers.
    ///
    /// Subscribing the same handler twice registers it twice; each
    /// registration is delivered to and removed independently.
    pub fn subscribe(&self, key: K, handler: Handler<P>) -> &Self {
        self.push(key, Subscription::plain(handler));
        self
    }

    /// Append a handler that is delivered at most one publish.
    ///
    /// The entry removes itself from the registry right before the handler
    /// runs, so a handler that re-subscribes and re-publishes sees a clean
    /// state. `unsubscribe(key, Some(&handler))` matches it like a plain
    /// subscription.
    pub fn subscribe_once(&self, key: K, handler: Handler<P>) -> &Self {
        self.push(key, Subscription::once(handler));
        self
    }

    /// Remove subscribers from `key`.
    ///
    /// With a handler, removes the earliest registration of that handler, if
    /// any. Without one, clears every subscriber of `key`. A publish already
    /// in flight still finishes delivering to its snapshot.
    pub fn unsubscribe(&self, key: K, handler: Option<&Handler<P>>) -> &Self {
        let mut subs = self.inner.subscriptions.write();
        let list = subs.entry(key.clone()).or_default();

        match handler {
            None => {
                tracing::trace!(key = ?key, removed = list.len(), "cleared subscribers");
                list.clear();
            }
            Some(handler) => {
                if let Some(pos) = list.iter().position(|sub| &sub.identity == handler) {
                    list.remove(pos);
                    tracing::trace!(key = ?key, remaining = list.len(), "removed subscriber");
                }
            }
        }

        self
    }

    /// Deliver `payload` to every current subscriber of `key`, in
    /// registration order.
    ///
    /// The subscriber list is copied first: handlers added or removed during
    /// this call only affect later publishes. A panicking handler unwinds out
    /// of this call and the remaining handlers are not invoked.
    pub fn publish(&self, key: K, payload: Option<&P>) -> &Self {
        let snapshot = self.snapshot(&key);
        tracing::trace!(key = ?key, listeners = snapshot.len(), "publish");

        for sub in &snapshot {
            if !sub.claim() {
                continue;
            }
            if sub.is_once() {
                self.remove_entry(&key, sub);
            }
            sub.identity.call(payload);
        }

        self
    }

    /// Schedule `publish(key, payload)` to run after the caller's current
    /// synchronous work, without invoking anything now.
    ///
    /// Deferred publishes run in the order they were scheduled. Fails only
    /// when the scheduler no longer accepts tasks.
    ///
    /// The scheduled task holds a handle to this registry until it runs, so
    /// undrained deferred work keeps the registry and its scheduler alive.
    pub fn publish_deferred(&self, key: K, payload: Option<P>) -> Result<&Self> {
        tracing::trace!(key = ?key, "publish deferred");

        let registry = self.clone();
        self.inner.scheduler.schedule(Box::new(move || {
            registry.publish(key, payload.as_ref());
        }))?;

        Ok(self)
    }

    /// Number of subscribers currently registered for `key`.
    pub fn listener_count(&self, key: &K) -> usize {
        self.inner
            .subscriptions
            .read()
            .get(key)
            .map_or(0, Vec::len)
    }

    /// Whether `key` has at least one subscriber.
    pub fn has_listeners(&self, key: &K) -> bool {
        self.listener_count(key) > 0
    }

    /// Every key referenced so far, including keys with no subscribers left.
    pub fn event_keys(&self) -> Vec<K> {
        self.inner.subscriptions.read().keys().cloned().collect()
    }

    fn push(&self, key: K, sub: Subscription<P>) {
        tracing::trace!(key = ?key, once = sub.is_once(), "subscribe");
        self.inner
            .subscriptions
            .write()
            .entry(key)
            .or_default()
            .push(sub);
    }

    fn snapshot(&self, key: &K) -> Vec<Subscription<P>> {
        if let Some(list) = self.inner.subscriptions.read().get(key) {
            return list.clone();
        }
        self.inner
            .subscriptions
            .write()
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Remove one specific fire-once entry. No-op if something else already
    /// removed it.
    fn remove_entry(&self, key: &K, entry: &Subscription<P>) {
        let mut subs = self.inner.subscriptions.write();
        if let Some(list) = subs.get_mut(key) {
            if let Some(pos) = list.iter().position(|sub| sub.same_entry(entry)) {
                list.remove(pos);
            }
        }
    }
}

impl<K, P> Clone for Registry<K, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: fmt::Debug, P> fmt::Debug for Registry<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subs = self.inner.subscriptions.read();
        f.debug_struct("Registry")
            .field("keys", &subs.len())
            .field(
                "subscriptions",
                &subs.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}
