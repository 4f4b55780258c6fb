//! Cancellable deferred tasks
//!
//! The long-press timer is the only thing in the input layer that fires
//! outside an event callback. Tasks are scheduled with a due instant and
//! delivered by [`DeferredTasks::poll`] from the frame loop; a cancelled
//! task is never delivered.

use std::time::Instant;

/// Handle returned by [`DeferredTasks::schedule`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct ScheduledTask<T> {
    handle: TaskHandle,
    due: Instant,
    payload: T,
}

/// A queue of payloads that become due at a given instant
#[derive(Debug)]
pub struct DeferredTasks<T> {
    next_id: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for DeferredTasks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredTasks<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    /// Schedule `payload` for delivery once `due` has passed
    pub fn schedule(&mut self, due: Instant, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask { handle, due, payload });
        handle
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Remove and return every payload due at `now`, earliest first
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = pending;
        due.sort_by_key(|t| (t.due, t.handle.0));
        due.into_iter().map(|t| t.payload).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
