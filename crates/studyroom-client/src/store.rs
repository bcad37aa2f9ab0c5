//! A single-value observable cell.
//!
//! [`KeyedStore`] is the seam between the session and whatever renders it:
//! readers call [`get`](KeyedStore::get) or register a callback with
//! [`subscribe`](KeyedStore::subscribe). Every [`set`](KeyedStore::set)
//! notifies every subscriber, in registration order, on the calling thread.
//! There is no equality short-circuit; callers decide whether a value
//! changed before they set it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
}

/// Observable cell shared by cloning.
pub struct KeyedStore<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for KeyedStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + 'static> Default for KeyedStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + 'static> KeyedStore<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(value),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the value and notifies every subscriber.
    ///
    /// Callbacks run after both locks are released, so a callback may call
    /// [`get`](Self::get), `set` or `subscribe` on the same store.
    pub fn set(&self, value: T) {
        *self
            .inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = value.clone();

        let callbacks: Vec<Callback<T>> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(&value);
        }
    }

    /// Registers `callback` for every future `set`.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let store: Weak<dyn Detach> = weak;
        Subscription { id, store }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T: Send> Detach for Inner<T> {
    fn detach(&self, id: u64) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sid, _)| *sid != id);
    }
}

/// Returned by [`KeyedStore::subscribe`].
///
/// Dropping it keeps the callback registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    store: Weak<dyn Detach>,
}

impl Subscription {
    /// Removes the callback. A no-op once the store itself is gone.
    pub fn unsubscribe(self) {
        if let Some(store) = self.store.upgrade() {
            store.detach(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_get_and_set() {
        let store = KeyedStore::new(1);
        assert_eq!(store.get(), 1);
        store.set(2);
        assert_eq!(store.get(), 2);
    }

    #[test]
    fn test_set_notifies_without_equality_check() {
        let store = KeyedStore::new(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let _sub = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.set(5);
        store.set(5);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let store = KeyedStore::new(0);
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let log = Arc::clone(&log);
            let _ = store.subscribe(move |v: &i32| log.lock().unwrap().push((name, *v)));
        }

        store.set(7);

        assert_eq!(*log.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_callback_may_read_the_store() {
        let store = KeyedStore::new(String::new());
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |_| *sink.lock().unwrap() = reader.get());

        store.set("hello".to_owned());

        assert_eq!(*seen.lock().unwrap(), "hello");
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = KeyedStore::new(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let sub = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        store.set(1);
        sub.unsubscribe();
        store.set(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_through_a_clone_of_an_optional_store() {
        let store: KeyedStore<Option<String>> = KeyedStore::new(None);
        let other = store.clone();
        let sub = other.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 1);

        sub.unsubscribe();

        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_after_store_dropped() {
        let store = KeyedStore::new(0);
        let sub = store.subscribe(|_| {});
        drop(store);
        sub.unsubscribe();
    }
}
