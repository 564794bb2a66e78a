//! Dependency Graph
//!
//! This module implements the nodes of lazy computation and the typed edges
//! callers use to refer to them.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes hold one value, produced exactly once
//! - Edges represent dependencies: if A is a source of B, A resolves first
//!
//! Each node records its fixed source set, the sources that already
//! resolved, and the consumers that named it as a source. When a node
//! resolves, it promotes each consumer; the consumer that sees its last
//! source resolve becomes ready.
//!
//! # Design Decisions
//!
//! 1. Sources are fixed when a node is declared and can only name nodes that
//!    already exist, so the public API cannot build a cycle.
//!
//! 2. Values are stored type-erased and recovered through the typed
//!    [`Edge`], keeping the payload type opaque to the scheduler.
//!
//! 3. Consumers are held weakly. The strong reference to a pending node lives
//!    in the solver's waiting set or ready queue.

mod edge;
mod node;
mod task;

pub use edge::Edge;
pub use node::NodeId;

pub(crate) use node::{NodeCore, SourceIds, Value};
pub(crate) use task::{Producer, Task};
