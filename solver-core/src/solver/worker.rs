//! Worker Loop
//!
//! A single worker thread executes every producer. Each iteration:
//!
//! 1. Stops with an aborted outcome if cancellation was requested or every
//!    solver handle was dropped.
//! 2. Polls the ready queue with the configured bounded timeout.
//! 3. Runs the dequeued node, if any, and promotes its consumers.
//! 4. Keeps going while not joining, or while joining and the ready queue is
//!    non-empty.
//!
//! Once joining, nodes still waiting for sources are abandoned: the pass
//! reports success and lists them in [`Outcome::Solved`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use tracing::{debug, debug_span, error, trace, warn};

use super::completion::{Completion, Outcome};
use super::runtime::Shared;
use crate::error::AbortReason;
use crate::graph::{NodeCore, Task};

/// Resolves the completion signal as interrupted if the worker unwinds
/// before resolving it.
struct FinishGuard<'a>(&'a Completion);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if self.0.resolve(Outcome::Aborted(AbortReason::Interrupted)) {
            error!("solver worker exited without finishing the pass");
        }
    }
}

impl<C> Shared<C>
where
    C: Send + Sync + 'static,
{
    /// Body of the worker thread.
    pub(crate) fn run_worker(&self) {
        let span = debug_span!("solver_worker", solver = ?self.owner);
        let _enter = span.enter();
        let _guard = FinishGuard(&self.completion);
        let _ = self.worker.set(thread::current().id());

        let outcome = self.drive();
        match &outcome {
            Outcome::Solved { abandoned } => {
                debug!(abandoned = abandoned.len(), "solver pass finished");
            }
            Outcome::Aborted(reason) => {
                debug!(%reason, "solver pass aborted");
            }
        }
        self.completion.resolve(outcome);
    }

    fn drive(&self) -> Outcome {
        loop {
            if let Some(reason) = self.interruption() {
                return self.abort(reason);
            }

            if let Some(task) = self.ready.poll(self.config.poll_interval) {
                // Cancellation may have arrived while we were waiting.
                if let Some(reason) = self.interruption() {
                    drop(task);
                    return self.abort(reason);
                }
                if let Err(reason) = self.execute(task) {
                    return self.abort(reason);
                }
            }

            if !self.keep_running() {
                if let Some(outcome) = self.finish() {
                    return outcome;
                }
            }
        }
    }

    fn interruption(&self) -> Option<AbortReason> {
        if self.cancel.is_cancelled() {
            Some(AbortReason::Cancelled)
        } else if self.shutdown.load(Ordering::Acquire) {
            Some(AbortReason::Interrupted)
        } else {
            None
        }
    }

    fn keep_running(&self) -> bool {
        !self.joining.load(Ordering::Acquire) || !self.ready.is_empty()
    }

    /// Run one node and promote its consumers.
    fn execute(&self, task: Task<C>) -> Result<(), AbortReason> {
        let node = task.id();
        trace!(?node, "running node");

        let result = if self.config.catch_panics {
            panic::catch_unwind(AssertUnwindSafe(|| task.run(&self.context)))
        } else {
            Ok(task.run(&self.context))
        };

        match result {
            Ok(Ok(resolved)) => {
                self.promote_consumers(&resolved);
                Ok(())
            }
            Ok(Err(err)) => {
                error!(?node, error = %err, "producer failed");
                Err(AbortReason::ProducerFailed {
                    node,
                    message: err.to_string(),
                })
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(?node, %message, "producer panicked");
                Err(AbortReason::ProducerPanicked { node, message })
            }
        }
    }

    /// Tell every consumer of `resolved` that it resolved, moving consumers
    /// whose last source this was from the waiting set to the ready queue.
    fn promote_consumers(&self, resolved: &Arc<NodeCore>) {
        let mut graph = self.graph.lock();

        for consumer in resolved.take_consumers() {
            let Some(consumer) = consumer.upgrade() else {
                continue;
            };
            if !consumer.record_resolved(resolved.id()) {
                continue;
            }
            // Only the promotion that completes the source set finds the handle.
            let Some(handle) = consumer.take_waiting() else {
                continue;
            };
            match graph.waiting.remove(handle) {
                Ok(task) => {
                    trace!(node = ?consumer.id(), by = ?resolved.id(), "node promoted");
                    self.ready.push(task);
                }
                Err(err) => {
                    warn!(
                        node = ?consumer.id(),
                        error = %err,
                        "promoted node missing from waiting set"
                    );
                }
            }
        }
    }

    fn abort(&self, reason: AbortReason) -> Outcome {
        let discarded_ready = self.ready.clear();
        let mut graph = self.graph.lock();
        let discarded_waiting = graph.waiting.len();
        graph.waiting.clear();

        debug!(%reason, discarded_ready, discarded_waiting, "discarding remaining nodes");
        Outcome::Aborted(reason)
    }

    /// Close the pass, or return `None` if a node became ready since the last
    /// check. `register` pushes under the graph lock, so the recheck here is
    /// final.
    fn finish(&self) -> Option<Outcome> {
        let graph = self.graph.lock();
        if !self.ready.is_empty() {
            return None;
        }
        let abandoned: Vec<_> = graph.waiting.iter().map(Task::id).collect();

        for node in &abandoned {
            warn!(?node, "node abandoned with unresolved sources");
        }
        Some(Outcome::Solved { abandoned })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
