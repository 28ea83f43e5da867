//! Bounded blocking FIFO queue: one mutex, two condition variables.

use anyhow::{Result, bail};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Returned by [`BoundedQueue::put`] when the queue stayed full for the whole timeout.
/// Carries the rejected item back so the caller still owns it.
pub struct Full<T>(pub T);

impl<T> Full<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue stayed full until the put timeout expired")
    }
}

/// Capacity-limited FIFO. `put` blocks while full, `get` blocks while empty.
///
/// `not_full` and `not_empty` both wait on the same mutex, so occupancy checks and
/// mutations are always observed under one lock.
pub struct BoundedQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items. Fails when `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            bail!("queue capacity must be positive, got {}", capacity);
        }
        Ok(Self {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `item`, blocking while the queue is full.
    ///
    /// With `timeout: None` this waits indefinitely. With `Some(t)`, returns `Err(Full(item))`
    /// once `t` has elapsed since entry and the queue is still full; nothing is inserted.
    pub fn put(&self, item: T, timeout: Option<Duration>) -> std::result::Result<(), Full<T>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut items = self.lock();
        while items.len() >= self.capacity {
            items = match deadline {
                None => self.not_full.wait(items).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(Full(item));
                    }
                    self.not_full
                        .wait_timeout(items, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove and return the head item, blocking while the queue is empty.
    ///
    /// With `Some(t)`, returns `None` once `t` has elapsed since entry and nothing arrived.
    pub fn get(&self, timeout: Option<Duration>) -> Option<T> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            items = match deadline {
                None => self.not_empty.wait(items).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return None;
                    }
                    self.not_empty
                        .wait_timeout(items, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Non-blocking put: fails immediately when full.
    pub fn try_put(&self, item: T) -> std::result::Result<(), Full<T>> {
        self.put(item, Some(Duration::ZERO))
    }

    /// Non-blocking get: `None` immediately when empty.
    pub fn try_get(&self) -> Option<T> {
        self.get(Some(Duration::ZERO))
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().len() >= self.capacity
    }

    // Every mutation is a single push/pop, so a poisoned guard still holds a valid deque.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .finish()
    }
}
