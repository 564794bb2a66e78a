//! Graph Nodes
//!
//! This module defines the per-node state shared between the edges handed to
//! callers and the tasks queued inside the solver.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::list::{Handle, ListId};

/// A resolved node value, type-erased.
pub(crate) type Value = Box<dyn Any + Send + Sync>;

/// Source id lists are short in practice; most facts depend on one to three
/// others.
pub(crate) type SourceIds = SmallVec<[NodeId; 4]>;

/// Unique identifier for a node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Mutable bookkeeping of a node.
///
/// Only touched while the owning solver's graph lock is held.
#[derive(Default)]
struct Bookkeeping {
    /// Sources that have already resolved.
    resolved_sources: SourceIds,

    /// Nodes that named this node as a source. Weak so an abandoned consumer
    /// holding this node's edge does not keep both alive.
    consumers: Vec<Weak<NodeCore>>,

    /// Position in the waiting set, while the node waits there.
    waiting: Option<Handle>,
}

/// Shared state of one node of lazy computation.
pub(crate) struct NodeCore {
    id: NodeId,

    /// Waiting-set id of the solver that owns this node.
    owner: ListId,

    /// Fixed at construction, never mutated afterward.
    sources: SourceIds,

    /// Set exactly once, by the worker, after the producer returns.
    value: OnceLock<Value>,

    book: Mutex<Bookkeeping>,
}

impl NodeCore {
    /// Create a node owned by the solver whose waiting set is `owner`.
    pub(crate) fn new(owner: ListId, sources: SourceIds) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::new(),
            owner,
            sources,
            value: OnceLock::new(),
            book: Mutex::new(Bookkeeping::default()),
        })
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn owner(&self) -> ListId {
        self.owner
    }

    pub(crate) fn sources(&self) -> &[NodeId] {
        &self.sources
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    pub(crate) fn value(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.value.get().map(|value| value.as_ref())
    }

    /// Store the produced value. Returns false if a value was already stored.
    pub(crate) fn store(&self, value: Value) -> bool {
        self.value.set(value).is_ok()
    }

    /// Register `consumer` as depending on this node.
    ///
    /// Returns false without registering when this node has already resolved;
    /// the caller then counts this source as satisfied instead.
    pub(crate) fn attach_consumer(&self, consumer: &Arc<NodeCore>) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.book.lock().consumers.push(Arc::downgrade(consumer));
        true
    }

    /// Take the registered consumers, leaving none behind.
    pub(crate) fn take_consumers(&self) -> Vec<Weak<NodeCore>> {
        std::mem::take(&mut self.book.lock().consumers)
    }

    #[cfg(test)]
    pub(crate) fn consumer_count(&self) -> usize {
        self.book.lock().consumers.len()
    }

    /// Record that `source` resolved. Returns true once every source has.
    ///
    /// Recording the same source twice has no effect.
    pub(crate) fn record_resolved(&self, source: NodeId) -> bool {
        let mut book = self.book.lock();
        if self.sources.contains(&source) && !book.resolved_sources.contains(&source) {
            book.resolved_sources.push(source);
        }
        book.resolved_sources.len() == self.sources.len()
    }

    pub(crate) fn resolved_source_count(&self) -> usize {
        self.book.lock().resolved_sources.len()
    }

    pub(crate) fn set_waiting(&self, handle: Handle) {
        self.book.lock().waiting = Some(handle);
    }

    /// Take the waiting-set handle. Only the first caller gets it.
    pub(crate) fn take_waiting(&self) -> Option<Handle> {
        self.book.lock().waiting.take()
    }
}

impl std::fmt::Debug for NodeCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCore")
            .field("id", &self.id)
            .field("sources", &self.sources)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
