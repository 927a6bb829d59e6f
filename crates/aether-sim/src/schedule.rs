//! Priority queue of callbacks keyed by simulated time.
//!
//! Payloads are stored inline in the heap and dispatched by the caller when
//! popped, so scheduling does not box anything. Ties on the due time pop in
//! insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use aether_common::CallbackId;
use serde::{Deserialize, Serialize};

use crate::time::WorldDateTime;

/// Initial heap capacity.
const DEFAULT_CAPACITY: usize = 16;

/// Payload the world clock schedules against simulated time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledEvent {
    /// Start a weather transition to the named preset.
    WeatherChange {
        /// Preset name in the preset library.
        preset: String,
    },
    /// Application-defined marker, handed back untouched.
    Marker {
        /// Caller-chosen tag.
        tag: u32,
    },
}

/// A callback that has come due.
#[derive(Debug, Clone, PartialEq)]
pub struct DueCallback<T> {
    /// Handle returned when it was scheduled.
    pub id: CallbackId,
    /// Simulated time it was scheduled for.
    pub due: WorldDateTime,
    /// The scheduled payload.
    pub payload: T,
}

/// Heap entry for the callback queue.
#[derive(Debug)]
struct Entry<T> {
    due: WorldDateTime,
    id: CallbackId,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, earliest due (then oldest) first
        match other.due.cmp(&self.due) {
            Ordering::Equal => other.id.cmp(&self.id),
            other => other,
        }
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending callbacks ordered by due time.
#[derive(Debug)]
pub struct ScheduledCallbacks<T> {
    heap: BinaryHeap<Entry<T>>,
    next_id: u64,
}

impl<T> Default for ScheduledCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScheduledCallbacks<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::with_capacity(DEFAULT_CAPACITY),
            next_id: 1,
        }
    }

    /// Schedules `payload` to fire at `due`.
    pub fn schedule(&mut self, due: WorldDateTime, payload: T) -> CallbackId {
        let id = CallbackId::new(self.next_id);
        self.next_id += 1;
        self.heap.push(Entry { due, id, payload });
        id
    }

    /// Pops the earliest callback if it is due at or before `now`.
    pub fn pop_due(&mut self, now: WorldDateTime) -> Option<DueCallback<T>> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|entry| DueCallback {
            id: entry.id,
            due: entry.due,
            payload: entry.payload,
        })
    }

    /// Pops every callback due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: WorldDateTime) -> Vec<DueCallback<T>> {
        let mut due = Vec::new();
        while let Some(callback) = self.pop_due(now) {
            due.push(callback);
        }
        due
    }

    /// Due time of the next callback.
    #[must_use]
    pub fn peek_due_time(&self) -> Option<WorldDateTime> {
        self.heap.peek().map(|entry| entry.due)
    }

    /// Number of pending callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every pending callback.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
