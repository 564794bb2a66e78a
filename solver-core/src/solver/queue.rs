//! Ready queue shared by declaring threads and the worker.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::graph::Task;

/// Blocking FIFO of tasks whose sources have all resolved.
pub(crate) struct ReadyQueue<C> {
    tasks: Mutex<VecDeque<Task<C>>>,
    available: Condvar,
}

impl<C> ReadyQueue<C> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub(crate) fn push(&self, task: Task<C>) {
        self.tasks.lock().push_back(task);
        self.available.notify_one();
    }

    /// Pop the next task, waiting at most `timeout` for one to arrive.
    pub(crate) fn poll(&self, timeout: Duration) -> Option<Task<C>> {
        let mut tasks = self.tasks.lock();
        if tasks.is_empty() {
            self.available.wait_for(&mut tasks, timeout);
        }
        tasks.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Drop every queued task. Returns how many were discarded.
    pub(crate) fn clear(&self) -> usize {
        let mut tasks = self.tasks.lock();
        let discarded = tasks.len();
        tasks.clear();
        discarded
    }
}
