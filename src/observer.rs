//! Synchronous listener registry.
//!
//! Both stores hand out [`Subscription`] guards from a [`Listeners`] registry.
//! Delivery is synchronous and follows registration order. A listener is only
//! ever called for notifications raised after it subscribed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered set of callbacks observing values of type `T`.
pub struct Listeners<T: ?Sized> {
    inner: Arc<ListenersInner<T>>,
}

struct ListenersInner<T: ?Sized> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Callback<T>)>>,
}

impl<T: ?Sized> ListenersInner<T> {
    fn remove(&self, id: u64) {
        self.entries.write().retain(|(entry_id, _)| *entry_id != id);
    }
}

impl<T: ?Sized + 'static> Listeners<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ListenersInner {
                next_id: AtomicU64::new(0),
                entries: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register `callback`; it stays registered until the returned guard is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.write().push((id, Arc::new(callback)));

        let registry: Weak<ListenersInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.remove(id);
                }
            })),
        }
    }

    /// Invoke every registered callback with `value`, in registration order.
    ///
    /// The callback list is snapshotted first, so a callback may subscribe or
    /// unsubscribe without deadlocking. Changes take effect on the next call.
    pub fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .inner
            .entries
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(value);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Whether no one is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.inner.entries.read().len())
            .finish()
    }
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    /// Keep the listener registered for the lifetime of the registry.
    pub fn detach(mut self) {
        self.release = None;
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_notify_in_registration_order() {
        let listeners: Listeners<u32> = Listeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let seen = Arc::clone(&seen);
            listeners.subscribe(move |v| seen.lock().push(("first", *v)))
        };
        let second = {
            let seen = Arc::clone(&seen);
            listeners.subscribe(move |v| seen.lock().push(("second", *v)))
        };

        listeners.notify(&7);
        assert_eq!(*seen.lock(), vec![("first", 7), ("second", 7)]);

        drop(first);
        drop(second);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let listeners: Listeners<str> = Listeners::new();
        let count = Arc::new(Mutex::new(0));

        let sub = {
            let count = Arc::clone(&count);
            listeners.subscribe(move |_| *count.lock() += 1)
        };
        listeners.notify("a");
        sub.unsubscribe();
        listeners.notify("b");

        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let listeners: Listeners<u8> = Listeners::new();
        listeners.subscribe(|_| {}).detach();
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_subscription_outliving_registry() {
        let listeners: Listeners<u8> = Listeners::new();
        let sub = listeners.subscribe(|_| {});
        drop(listeners);
        sub.unsubscribe();
    }

    #[test]
    fn test_subscribe_inside_callback() {
        let listeners: Listeners<u8> = Listeners::new();
        let nested = Arc::new(Mutex::new(Vec::new()));
        let registry = listeners.clone();
        let holder = Arc::clone(&nested);
        let _outer = listeners.subscribe(move |_| {
            holder.lock().push(registry.subscribe(|_| {}));
        });

        listeners.notify(&1);
        assert_eq!(listeners.len(), 2);
    }
}
