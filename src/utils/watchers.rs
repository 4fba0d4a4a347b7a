//! Fan-out of change notifications to any number of channel subscribers.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Mutex;

use super::locks::lock;

/// Subscriber list. Each subscriber gets its own unbounded receiver; senders whose receiver
/// was dropped are pruned on the next notify.
pub struct Watchers<T> {
    senders: Mutex<Vec<Sender<T>>>,
}

impl<T> Default for Watchers<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Watchers<T> {
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        lock(&self.senders).push(tx);
        rx
    }

    /// Deliver `value` to every live subscriber, in subscription order.
    pub fn notify(&self, value: T) {
        lock(&self.senders).retain(|tx| tx.send(value.clone()).is_ok());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        lock(&self.senders).len()
    }
}

impl<T> std::fmt::Debug for Watchers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchers")
            .field("subscribers", &lock(&self.senders).len())
            .finish()
    }
}
