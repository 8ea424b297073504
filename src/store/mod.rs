//! Observable value cells
//!
//! A [`Store`] holds one current value and a list of subscribers. Every `set`
//! notifies the subscribers synchronously, in registration order. Contexts
//! hand stores to consumers, which read them with `get` or react to them with
//! `subscribe`.
//!
//! Values set from inside a subscriber are queued and delivered after the
//! current round of notifications, so every subscriber observes the values in
//! the order they were set.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Observable cell with synchronous change notification
pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<(u64, Subscriber<T>)>>,
    dispatch: Mutex<Dispatch<T>>,
    next_id: AtomicU64,
}

struct Dispatch<T> {
    queue: VecDeque<T>,
    running: bool,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Store<T> {
    /// Create a store holding `value`
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                value: Mutex::new(value),
                subscribers: Mutex::new(Vec::new()),
                dispatch: Mutex::new(Dispatch {
                    queue: VecDeque::new(),
                    running: false,
                }),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Point-in-time copy of the current value
    pub fn get(&self) -> T {
        self.inner.value.lock().clone()
    }

    /// Borrow the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.lock())
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        *self.inner.value.lock() = value.clone();
        self.publish(value);
    }

    /// Derive the next value from the current one, then notify subscribers
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = {
            let mut guard = self.inner.value.lock();
            let next = f(&guard);
            *guard = next.clone();
            next
        };
        self.publish(next);
    }

    /// Register `callback` and invoke it immediately with the current value
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Subscriber<T> = Arc::new(callback);
        self.inner
            .subscribers
            .lock()
            .push((id, Arc::clone(&callback)));

        let current = self.get();
        callback(&current);
        Subscription(id)
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(id, _)| *id != subscription.0);
        subscribers.len() != before
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    fn publish(&self, value: T) {
        {
            let mut dispatch = self.inner.dispatch.lock();
            dispatch.queue.push_back(value);
            if dispatch.running {
                return;
            }
            dispatch.running = true;
        }

        loop {
            let next = {
                let mut dispatch = self.inner.dispatch.lock();
                match dispatch.queue.pop_front() {
                    Some(value) => value,
                    None => {
                        dispatch.running = false;
                        return;
                    }
                }
            };

            let subscribers: Vec<Subscriber<T>> = self
                .inner
                .subscribers
                .lock()
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();

            for callback in subscribers {
                callback(&next);
            }
        }
    }
}

impl<T: Clone + Send + Default + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &*self.inner.value.lock())
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}
