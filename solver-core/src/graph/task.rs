//! Runnable units: a node plus the producer that computes its value.

use std::sync::Arc;

use super::node::{NodeCore, NodeId, Value};
use crate::error::ProducerError;

/// Type-erased producer. Typed builders wrap the caller's closure into this,
/// capturing the source edges so their values can be read when it runs.
pub(crate) type Producer<C> = Box<dyn FnOnce(&C) -> Result<Value, ProducerError> + Send>;

/// A node waiting for its sources, or ready to run.
///
/// The producer is consumed by [`Task::run`], so a node can run at most once.
pub(crate) struct Task<C> {
    node: Arc<NodeCore>,
    producer: Producer<C>,
}

impl<C> Task<C> {
    pub(crate) fn new(node: Arc<NodeCore>, producer: Producer<C>) -> Self {
        Self { node, producer }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.node.id()
    }

    /// Invoke the producer and store its value. Returns the node so the caller
    /// can fan out promotions.
    pub(crate) fn run(self, context: &C) -> Result<Arc<NodeCore>, ProducerError> {
        let value = (self.producer)(context)?;
        self.node.store(value);
        Ok(self.node)
    }
}

impl<C> std::fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("node", &self.node).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::SourceIds;
    use crate::list::ListId;

    #[test]
    fn run_stores_value() {
        let node = NodeCore::new(ListId::new(), SourceIds::new());
        let producer = |ctx: &i32| -> Result<Value, ProducerError> { Ok(Box::new(*ctx + 1)) };
        let task: Task<i32> = Task::new(node, Box::new(producer));

        let node = task.run(&41).unwrap();
        assert_eq!(node.value().and_then(|v| v.downcast_ref::<i32>()), Some(&42));
    }

    #[test]
    fn failing_producer_leaves_node_unresolved() {
        let node = NodeCore::new(ListId::new(), SourceIds::new());
        let producer = |_: &()| -> Result<Value, ProducerError> { Err("no schema".into()) };
        let task: Task<()> = Task::new(Arc::clone(&node), Box::new(producer));

        let err = task.run(&()).unwrap_err();
        assert_eq!(err.to_string(), "no schema");
        assert!(!node.is_resolved());
    }
}
