use parking_lot::RwLock;
use std::collections::VecDeque;

use crate::models::{Alert, Metric};

/// Retained metric samples, oldest first.
pub type MetricStore = BoundedRing<Metric>;

/// Retained alerts, oldest first.
pub type AlertStore = BoundedRing<Alert>;

/// A capacity-bounded, append-only sequence. Pushing past capacity evicts
/// from the front so the ring always holds the most recent window.
///
/// All access goes through one lock, so a snapshot never observes a
/// partially applied push or batch.
#[derive(Debug)]
pub struct BoundedRing<T> {
    capacity: usize,
    entries: RwLock<VecDeque<T>>,
}

impl<T: Clone> BoundedRing<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(&self, item: T) {
        let mut entries = self.entries.write();
        entries.push_back(item);
        Self::evict(&mut entries, self.capacity);
    }

    /// Appends a whole batch under a single write lock.
    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut entries = self.entries.write();
        entries.extend(items);
        Self::evict(&mut entries, self.capacity);
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict(entries: &mut VecDeque<T>, capacity: usize) {
        if entries.len() > capacity {
            let excess = entries.len() - capacity;
            entries.drain(..excess);
        }
    }
}
