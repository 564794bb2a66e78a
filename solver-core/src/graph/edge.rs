//! Typed handles on graph nodes.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::node::{NodeCore, NodeId};
use crate::error::SolverError;

/// A declared node producing a value of type `T`.
///
/// Edges are what the combinators return and what they accept as
/// dependencies. Cloning an edge is cheap and refers to the same node.
///
/// Values are normally read from inside producer closures, where every
/// declared source is guaranteed to have resolved. Reading from outside is
/// possible once the pass completed.
pub struct Edge<T> {
    node: Arc<NodeCore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Edge<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(node: Arc<NodeCore>) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    /// Get the underlying node's ID.
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    /// Check if the node's producer has run.
    pub fn is_resolved(&self) -> bool {
        self.node.is_resolved()
    }

    /// Get the resolved value, or [`SolverError::Unresolved`] if the node has
    /// not run yet.
    pub fn try_value(&self) -> Result<&T, SolverError> {
        self.node
            .value()
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or(SolverError::Unresolved { node: self.id() })
    }

    /// Get the resolved value.
    ///
    /// # Panics
    ///
    /// Panics if the node has not resolved. Inside a producer this cannot
    /// happen for declared sources.
    pub fn value(&self) -> &T {
        match self.try_value() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    pub(crate) fn node(&self) -> &Arc<NodeCore> {
        &self.node
    }
}

impl<T> Clone for Edge<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("id", &self.node.id())
            .field("resolved", &self.node.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::SourceIds;
    use crate::list::ListId;

    #[test]
    fn unresolved_edge_reports_error() {
        let edge: Edge<i32> = Edge::new(NodeCore::new(ListId::new(), SourceIds::new()));

        assert!(!edge.is_resolved());
        assert!(matches!(
            edge.try_value(),
            Err(SolverError::Unresolved { node }) if node == edge.id()
        ));
    }

    #[test]
    #[should_panic(expected = "has not resolved yet")]
    fn reading_unresolved_value_panics() {
        let edge: Edge<i32> = Edge::new(NodeCore::new(ListId::new(), SourceIds::new()));
        edge.value();
    }

    #[test]
    fn clone_refers_to_same_node() {
        let edge: Edge<String> = Edge::new(NodeCore::new(ListId::new(), SourceIds::new()));
        let clone = edge.clone();

        edge.node().store(Box::new("orders".to_string()));

        assert_eq!(clone.id(), edge.id());
        assert_eq!(clone.value(), "orders");
    }
}
