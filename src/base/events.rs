//! Ordered observer lists.
//!
//! An [`EventEmitter`] delivers each emitted event to every subscriber in
//! subscription order, synchronously, before `emit` returns. Nothing here is
//! thread-aware: emitters live on the single thread that owns the tree.

use std::fmt;

/// Handle returned by [`EventEmitter::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Callback<E> = Box<dyn FnMut(&E)>;

/// A list of callbacks interested in events of type `E`.
pub struct EventEmitter<E> {
    subscribers: Vec<(SubscriptionId, Callback<E>)>,
    next_id: usize,
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a callback. It receives every event emitted after this call.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    /// Deliver `event` to every subscriber in subscription order.
    pub fn emit(&mut self, event: &E) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
