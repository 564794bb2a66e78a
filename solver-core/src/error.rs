//! Error types for node declaration and pass execution.

use std::io;

use thiserror::Error;

use crate::graph::NodeId;

/// Error returned by a failing producer.
///
/// Any `std::error::Error + Send + Sync` type converts into this, as do
/// `String` and `&str`.
pub type ProducerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the solver's public API.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The same source was named twice in one declaration.
    #[error("node {node:?} is listed more than once as a dependency")]
    DuplicateDependency {
        /// The repeated source.
        node: NodeId,
    },

    /// A source edge was created by a different solver.
    #[error("node {node:?} belongs to another solver")]
    ForeignEdge {
        /// The foreign source.
        node: NodeId,
    },

    /// A node's value was read before the node resolved.
    #[error("node {node:?} has not resolved yet")]
    Unresolved {
        /// The node that was read.
        node: NodeId,
    },

    /// `start()` was called on a solver whose worker is already running.
    #[error("solver worker already started")]
    AlreadyStarted,

    /// The worker thread could not be spawned.
    #[error("failed to spawn solver worker: {0}")]
    Spawn(#[from] io::Error),
}

/// Why a pass stopped before draining.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    /// The cancellation token was triggered.
    #[error("pass cancelled")]
    Cancelled,

    /// The worker was torn down while waiting for work.
    #[error("solver worker interrupted")]
    Interrupted,

    /// A producer returned an error.
    #[error("producer for node {node:?} failed: {message}")]
    ProducerFailed {
        /// The node whose producer failed.
        node: NodeId,
        /// Rendered producer error.
        message: String,
    },

    /// A producer panicked.
    #[error("producer for node {node:?} panicked: {message}")]
    ProducerPanicked {
        /// The node whose producer panicked.
        node: NodeId,
        /// Panic payload, when it was a string.
        message: String,
    },
}
