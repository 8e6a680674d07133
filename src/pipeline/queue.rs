//! Bounded blocking FIFO queue connecting two pipeline stages
//!
//! This is the only communication channel between stages: a fixed-capacity
//! queue where `put` blocks while the queue is full and `get` blocks while it
//! is empty. Backpressure falls out of the blocking `put` — a slow consumer
//! stalls its producer instead of letting buffers grow without bound.
//!
//! # Design
//!
//! The classic bounded-buffer split: one mutex protecting the underlying
//! `VecDeque`, plus two condition variables — `not_full` for blocked
//! producers and `not_empty` for blocked consumers. The mutex alone cannot
//! express "wait until there is room" without polling; the two condvars
//! encode exactly which side may proceed after each handoff.
//!
//! Each queue is shared by exactly one producer stage and one consumer stage.
//! The mutual exclusion still matters: producer and consumer mutate the same
//! deque concurrently.
//!
//! # Cancellation
//!
//! `close` marks the queue closed and wakes every blocked caller. It is used
//! only for shutdown propagation (an early-stopped sink would otherwise leave
//! its producer blocked forever in `put` against a queue nobody drains).
//! Normal end-of-stream never closes a queue; it flows through the queue as a
//! regular item (see `StreamItem::EndOfStream`).

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// Error returned by [`BoundedQueue::put`] when the queue has been closed.
///
/// Hands the rejected item back to the caller so nothing is silently dropped.
#[derive(Debug)]
pub struct QueueClosed<T>(pub T);

impl<T> std::fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "queue closed")
    }
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Fixed-capacity blocking FIFO queue for one producer and one consumer.
///
/// Invariants:
/// - `0 <= len <= capacity` at all times
/// - items come out in exactly the order they went in
/// - no item is lost or duplicated between `put` and `get`
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero: a zero-capacity queue can never transfer
    /// an item, so both sides would block forever.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedQueue capacity must be non-zero");
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Append `item` at the tail, blocking while the queue is at capacity.
    ///
    /// Returns only after the item is enqueued, or returns the item back in
    /// `Err(QueueClosed)` if the queue was closed before room appeared.
    pub fn put(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.state.lock().unwrap();
        while state.items.len() == self.capacity && !state.closed {
            state = self.not_full.wait(state).unwrap();
        }
        if state.closed {
            return Err(QueueClosed(item));
        }
        debug_assert!(state.items.len() < self.capacity);
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove and return the head item, blocking while the queue is empty.
    ///
    /// Returns `None` only once the queue is closed *and* fully drained;
    /// items enqueued before `close` are still delivered.
    pub fn get(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        while state.items.is_empty() && !state.closed {
            state = self.not_empty.wait(state).unwrap();
        }
        let item = state.items.pop_front();
        drop(state);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Attempt to enqueue without blocking.
    ///
    /// Returns the item back if the queue is full or closed.
    pub fn try_put(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.state.lock().unwrap();
        if state.closed || state.items.len() == self.capacity {
            return Err(QueueClosed(item));
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Close the queue and wake every blocked `put` and `get`.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Number of items currently buffered.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    /// Whether the queue currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity this queue was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
