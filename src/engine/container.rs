//! Thread-safe unbounded list used as pipeline source and sink.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append at the tail, pop from the head. Every operation takes the same lock; never blocks on content.
#[derive(Debug)]
pub struct Container<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Container<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Build a container holding `items` in iteration order.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            items: Mutex::new(items.into_iter().collect()),
        }
    }

    pub fn add(&self, item: T) {
        self.lock().push_back(item);
    }

    /// Pop the head item; `None` when empty.
    pub fn remove(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take every item out, leaving the container empty.
    pub fn drain_all(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Container<T> {
    /// Point-in-time copy in head-to-tail order. The lock is released before returning.
    pub fn snapshot_all(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }
}
