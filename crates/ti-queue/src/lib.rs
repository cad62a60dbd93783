//! The item queue and its blocking consumer (spec.md §4.4, component C4).
//! Grounded on `QueueConsumer`/`StoppableThread` in
//! `original_source/totalimpact/backend.py`: `first`/`dequeue` poll the
//! queue every 0.5s until an item appears or shutdown is signalled.

use std::collections::VecDeque;
use std::sync::Mutex;
use ti_core::{interruptible_sleep, Item, Shutdown, Sleeper};

/// A queue of pending work items. Implementors need not be FIFO-strict
/// across processes — the in-memory implementation here only promises
/// exactly-once delivery within a single process (spec.md Open Question 2;
/// see DESIGN.md).
pub trait Queue: Send + Sync {
    /// Peek the next item without removing it, or `None` if empty.
    fn first(&self) -> Option<Item>;

    /// Remove and return the next item, or `None` if empty.
    fn dequeue(&self) -> Option<Item>;

    /// Push an item onto the back of the queue.
    fn enqueue(&self, item: Item);

    /// Commit `item` as fully processed, closing out the spec.md §4.4
    /// `dequeue -> process -> save_and_unqueue` loop. `item` has already
    /// left the queue via `dequeue`; a durable queue implementation would
    /// persist the item's final state here. The in-memory queue has no
    /// persistence layer (the DAO is out of scope), so this is a log-only
    /// commit point for callers to mark a clean finish.
    fn save_and_unqueue(&self, item: Item);
}

/// A single-process, `Mutex<VecDeque>`-backed queue. Matches the Python
/// source's Couch-view-backed queue's *observable* contract (pop-or-none)
/// without its cross-process persistence.
#[derive(Default)]
pub struct InMemoryQueue {
    items: Mutex<VecDeque<Item>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("InMemoryQueue: mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Queue for InMemoryQueue {
    fn first(&self) -> Option<Item> {
        self.items.lock().expect("InMemoryQueue: mutex poisoned").front().cloned()
    }

    fn dequeue(&self) -> Option<Item> {
        self.items.lock().expect("InMemoryQueue: mutex poisoned").pop_front()
    }

    fn enqueue(&self, item: Item) {
        self.items.lock().expect("InMemoryQueue: mutex poisoned").push_back(item);
    }

    fn save_and_unqueue(&self, item: Item) {
        tracing::debug!(item_id = item.id(), "item processed and unqueued");
    }
}

/// Block (cooperatively) until an item is available or shutdown is
/// signalled, polling every 0.5s (spec.md §4.4: "poll the queue every
/// `queue_poll_interval`, default 0.5s"). Returns `None` only when
/// shutdown fires while waiting.
pub async fn dequeue_blocking(queue: &dyn Queue, sleeper: &dyn Sleeper, shutdown: &Shutdown) -> Option<Item> {
    loop {
        if let Some(item) = queue.dequeue() {
            return Some(item);
        }
        if shutdown.is_signalled() {
            return None;
        }
        interruptible_sleep(sleeper, std::time::Duration::from_millis(500), shutdown).await;
        if shutdown.is_signalled() {
            return None;
        }
    }
}
