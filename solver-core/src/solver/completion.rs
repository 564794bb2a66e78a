//! Single-resolution completion signal for a pass.

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;

use crate::error::AbortReason;
use crate::graph::NodeId;

/// How a pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The ready queue drained.
    ///
    /// `abandoned` lists nodes that were still waiting for sources when the
    /// pass finished. They never ran.
    Solved {
        /// Nodes left in the waiting set.
        abandoned: Vec<NodeId>,
    },

    /// The pass stopped early. Remaining ready and waiting nodes were
    /// discarded.
    Aborted(AbortReason),
}

impl Outcome {
    /// Check if the pass drained cleanly.
    pub fn is_solved(&self) -> bool {
        matches!(self, Outcome::Solved { .. })
    }

    /// Nodes abandoned in the waiting set. Empty for aborted passes.
    pub fn abandoned(&self) -> &[NodeId] {
        match self {
            Outcome::Solved { abandoned } => abandoned,
            Outcome::Aborted(_) => &[],
        }
    }

    /// The abort reason, if the pass was aborted.
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            Outcome::Solved { .. } => None,
            Outcome::Aborted(reason) => Some(reason),
        }
    }
}

/// Resolved once by the worker, awaited by any number of joiners.
pub(crate) struct Completion {
    outcome: Mutex<Option<Outcome>>,
    resolved: Condvar,
    notify: Notify,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            resolved: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Resolve the signal. Later calls are ignored and return false.
    pub(crate) fn resolve(&self, outcome: Outcome) -> bool {
        {
            let mut slot = self.outcome.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
        }
        self.resolved.notify_all();
        self.notify.notify_waiters();
        true
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.outcome.lock().is_some()
    }

    pub(crate) fn peek(&self) -> Option<Outcome> {
        self.outcome.lock().clone()
    }

    /// Block the calling thread until the signal resolves.
    pub(crate) fn wait(&self) -> Outcome {
        let mut slot = self.outcome.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            self.resolved.wait(&mut slot);
        }
    }

    /// Wait without blocking a tokio worker thread.
    pub(crate) async fn wait_async(&self) -> Outcome {
        loop {
            // Register interest before checking, so a resolve in between
            // still wakes us.
            let notified = self.notify.notified();
            if let Some(outcome) = self.peek() {
                return outcome;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn resolves_only_once() {
        let completion = Completion::new();
        assert!(!completion.is_resolved());

        assert!(completion.resolve(Outcome::Solved { abandoned: vec![] }));
        assert!(!completion.resolve(Outcome::Aborted(AbortReason::Cancelled)));

        assert!(completion.wait().is_solved());
    }

    #[test]
    fn wait_blocks_until_resolved() {
        let completion = Arc::new(Completion::new());
        let resolver = Arc::clone(&completion);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            resolver.resolve(Outcome::Aborted(AbortReason::Interrupted));
        });

        let outcome = completion.wait();
        handle.join().unwrap();
        assert_eq!(outcome.abort_reason(), Some(&AbortReason::Interrupted));
        assert!(outcome.abandoned().is_empty());
    }

    #[tokio::test]
    async fn wait_async_observes_resolution() {
        let completion = Arc::new(Completion::new());
        let resolver = Arc::clone(&completion);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            resolver.resolve(Outcome::Solved {
                abandoned: vec![NodeId::from(7)],
            });
        });

        let outcome = completion.wait_async().await;
        handle.join().unwrap();
        assert_eq!(outcome.abandoned(), &[NodeId::from(7)]);
    }
}
