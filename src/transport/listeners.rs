//! Listener and correlation registries

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::protocol::{PushEvent, RpcResponse};

/// Callback invoked for every matching push event
pub type Callback = Arc<dyn Fn(&PushEvent) + Send + Sync>;

/// Handle returned by `Transport::listen`, used to deregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

struct Listener {
    handle: ListenerHandle,
    event: String,
    callback: Callback,
}

/// Standing event listeners, kept in registration order
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<Listener>>,
}

impl ListenerRegistry {
    /// Allocate a handle before the callback exists
    pub fn reserve(&self) -> ListenerHandle {
        ListenerHandle(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&self, handle: ListenerHandle, event: &str, callback: Callback) {
        self.entries.lock().push(Listener {
            handle,
            event: event.to_string(),
            callback,
        });
    }

    pub fn register(&self, event: &str, callback: Callback) -> ListenerHandle {
        let handle = self.reserve();
        self.insert(handle, event, callback);
        handle
    }

    pub fn remove(&self, handle: ListenerHandle) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|listener| listener.handle != handle);
        entries.len() != before
    }

    /// Snapshot of the callbacks registered for `event`.
    ///
    /// Fan-out iterates the snapshot with the lock released, so callbacks may
    /// register or remove listeners without affecting the current round.
    pub fn matching(&self, event: &str) -> Vec<Callback> {
        self.entries
            .lock()
            .iter()
            .filter(|listener| listener.event == event)
            .map(|listener| Arc::clone(&listener.callback))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// In-flight correlated requests keyed by transaction id
#[derive(Default)]
pub(crate) struct PendingRequests {
    entries: Mutex<HashMap<String, oneshot::Sender<RpcResponse>>>,
}

impl PendingRequests {
    pub fn register(&self, transaction_id: &str) -> oneshot::Receiver<RpcResponse> {
        let (tx, rx) = oneshot::channel();
        self.entries.lock().insert(transaction_id.to_string(), tx);
        rx
    }

    /// Hand `response` to its waiter. Returns false when nobody is waiting.
    pub fn resolve(&self, response: RpcResponse) -> bool {
        let waiter = self.entries.lock().remove(&response.transaction_id);
        match waiter {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    pub fn remove(&self, transaction_id: &str) {
        self.entries.lock().remove(transaction_id);
    }

    /// Register `transaction_id` and tie the entry's lifetime to the returned guard
    pub fn track(&self, transaction_id: &str) -> (PendingGuard<'_>, oneshot::Receiver<RpcResponse>) {
        let rx = self.register(transaction_id);
        let guard = PendingGuard {
            pending: self,
            transaction_id: transaction_id.to_string(),
        };
        (guard, rx)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Removes its correlation entry when dropped, whether the waiter finished,
/// failed or was abandoned
pub(crate) struct PendingGuard<'a> {
    pending: &'a PendingRequests,
    transaction_id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.transaction_id);
    }
}
