//! The shared result collection a run appends to.

use crossbeam_channel::Receiver;
use std::sync::{Arc, RwLock};

use crate::types::Entry;
use crate::utils::locks::{read, write};
use crate::utils::watchers::Watchers;

/// Change to a [`ResultCollection`].
#[derive(Clone, Debug)]
pub enum CollectionEvent {
    Added { index: usize, entry: Arc<Entry> },
    Cleared,
}

#[derive(Default)]
struct CollectionInner {
    entries: RwLock<Vec<Arc<Entry>>>,
    watchers: Watchers<CollectionEvent>,
}

/// Ordered entries of the current run, in completion order. Readable by anyone; written only
/// by the store's run consumer. Clones share the same collection.
#[derive(Clone, Default)]
pub struct ResultCollection {
    inner: Arc<CollectionInner>,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        read(&self.inner.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Arc<Entry>> {
        read(&self.inner.entries).get(index).cloned()
    }

    pub fn snapshot(&self) -> Vec<Arc<Entry>> {
        read(&self.inner.entries).clone()
    }

    pub fn subscribe(&self) -> Receiver<CollectionEvent> {
        self.inner.watchers.subscribe()
    }

    pub(crate) fn push(&self, entry: Entry) -> Arc<Entry> {
        let entry = Arc::new(entry);
        let index = {
            let mut entries = write(&self.inner.entries);
            entries.push(Arc::clone(&entry));
            entries.len() - 1
        };
        self.inner.watchers.notify(CollectionEvent::Added {
            index,
            entry: Arc::clone(&entry),
        });
        entry
    }

    pub(crate) fn clear(&self) {
        write(&self.inner.entries).clear();
        self.inner.watchers.notify(CollectionEvent::Cleared);
    }
}

impl std::fmt::Debug for ResultCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCollection")
            .field("len", &self.len())
            .finish()
    }
}
