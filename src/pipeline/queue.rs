//! Unbounded work queue with drain accounting
//!
//! Both pipeline queues (tasks and outcomes) need more than an MPMC channel:
//! the orchestrator must be able to wait until every item ever pushed,
//! including items discovered mid-crawl, has been *processed*, not merely
//! popped. Each `pop` therefore has a matching `task_done`, and `join`
//! resolves only when the pending count (queued plus in-flight) reaches zero.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::{Notify, Semaphore};

/// Unbounded multi-producer multi-consumer queue with join/task_done semantics
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    /// One permit per queued item; poppers park here when empty
    ready: Semaphore,
    /// Items pushed but not yet marked done (queued + in-flight)
    pending: Mutex<usize>,
    drained: Notify,
}

impl<T> WorkQueue<T> {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Semaphore::new(0),
            pending: Mutex::new(0),
            drained: Notify::new(),
        }
    }

    /// Pushes an item; never blocks
    pub fn push(&self, item: T) {
        {
            let mut pending = self.pending.lock().unwrap();
            *pending += 1;
        }
        self.items.lock().unwrap().push_back(item);
        self.ready.add_permits(1);
    }

    /// Pops the next item, suspending while the queue is empty
    ///
    /// The popped item stays pending until `task_done` is called for it.
    pub async fn pop(&self) -> T {
        let permit = self
            .ready
            .acquire()
            .await
            .expect("work queue semaphore closed");
        permit.forget();
        self.items
            .lock()
            .unwrap()
            .pop_front()
            .expect("ready permit issued without a queued item")
    }

    /// Pops the next item without waiting, if one is queued
    ///
    /// Like `pop`, the item stays pending until `task_done` is called.
    pub fn try_pop(&self) -> Option<T> {
        let permit = self.ready.try_acquire().ok()?;
        permit.forget();
        self.items.lock().unwrap().pop_front()
    }

    /// Marks one previously popped item as fully processed
    pub fn task_done(&self) {
        let mut pending = self.pending.lock().unwrap();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.drained.notify_waiters();
        }
    }

    /// Waits until every pushed item has been marked done
    ///
    /// Resolves immediately if nothing is pending.
    pub async fn join(&self) {
        loop {
            let drained = self.drained.notified();
            if *self.pending.lock().unwrap() == 0 {
                return;
            }
            drained.await;
        }
    }

    /// Number of items currently queued (excluding in-flight)
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Whether the queue holds no waiting items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of items pushed but not yet marked done
    pub fn pending(&self) -> usize {
        *self.pending.lock().unwrap()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
