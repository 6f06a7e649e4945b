//! Handler and subscription types.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Callback<P> = dyn Fn(Option<&P>) + Send + Sync;

/// A subscriber callback.
///
/// Handlers are compared by identity: clones of one `Handler` are equal to
/// each other, while two handlers built from the same closure body are not.
/// Keep a clone around if you need to unsubscribe it later.
pub struct Handler<P> {
    callback: Arc<Callback<P>>,
}

impl<P> Handler<P> {
    /// Wrap a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&P>) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(f),
        }
    }

    /// Invoke the callback with a payload.
    pub fn call(&self, payload: Option<&P>) {
        (self.callback)(payload)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.callback) as *const ()
    }
}

impl<P> Clone for Handler<P> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<P> PartialEq for Handler<P> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<P> Eq for Handler<P> {}

impl<P> fmt::Debug for Handler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", self.addr())
    }
}

/// One registered handler for one event key.
pub(crate) struct Subscription<P> {
    /// Value matched on removal. For fire-once entries this is still the
    /// caller's handler, not the wrapper behaviour around it.
    pub(crate) identity: Handler<P>,
    /// Set for fire-once entries; flipped by the first delivery.
    pub(crate) once: Option<Arc<AtomicBool>>,
}

impl<P> Subscription<P> {
    pub(crate) fn plain(handler: Handler<P>) -> Self {
        Self {
            identity: handler,
            once: None,
        }
    }

    pub(crate) fn once(handler: Handler<P>) -> Self {
        Self {
            identity: handler,
            once: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    pub(crate) fn is_once(&self) -> bool {
        self.once.is_some()
    }

    /// Whether both values refer to the same registered fire-once entry.
    pub(crate) fn same_entry(&self, other: &Subscription<P>) -> bool {
        match (&self.once, &other.once) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Claim the single delivery of a fire-once entry.
    ///
    /// Returns true for plain entries. For fire-once entries only the first
    /// caller gets true, even across overlapping snapshots.
    pub(crate) fn claim(&self) -> bool {
        match &self.once {
            None => true,
            Some(fired) => !fired.swap(true, Ordering::AcqRel),
        }
    }
}

impl<P> Clone for Subscription<P> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            once: self.once.clone(),
        }
    }
}

impl<P> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("identity", &self.identity)
            .field("once", &self.is_once())
            .finish()
    }
}
