//! Solver Runtime
//!
//! The solver owns the waiting set and the ready queue, accepts node
//! declarations from any thread, and runs the single worker that executes
//! them.
//!
//! # Locking
//!
//! One graph lock serializes every graph mutation: declaring a node,
//! promoting consumers after a node resolves, and moving a node from the
//! waiting set to the ready queue. Lock order is graph lock, then a node's
//! bookkeeping lock, then the ready queue. Producers run with no lock held,
//! so a producer may declare further nodes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use super::builder::{ForAll, ForAll2, ForAll3, ForAllOf};
use super::cancel::CancellationToken;
use super::completion::{Completion, Outcome};
use super::queue::ReadyQueue;
use crate::config::SolverConfig;
use crate::error::{AbortReason, ProducerError, SolverError};
use crate::graph::{Edge, NodeCore, Producer, SourceIds, Task, Value};
use crate::list::{LinkedList, ListId};

/// Graph state guarded by the graph lock.
pub(crate) struct Graph<Ctx> {
    /// Nodes with at least one unresolved source.
    pub(crate) waiting: LinkedList<Task<Ctx>>,
}

/// State shared between solver handles and the worker.
pub(crate) struct Shared<Ctx> {
    pub(crate) context: Ctx,
    pub(crate) config: SolverConfig,
    /// Id of the waiting set; doubles as the solver's identity for edges.
    pub(crate) owner: ListId,
    pub(crate) graph: Mutex<Graph<Ctx>>,
    pub(crate) ready: ReadyQueue<Ctx>,
    pub(crate) joining: AtomicBool,
    pub(crate) started: AtomicBool,
    /// Set once the last `Solver` handle is dropped.
    pub(crate) shutdown: AtomicBool,
    pub(crate) handles: AtomicUsize,
    /// Set by the worker thread when it starts.
    pub(crate) worker: OnceLock<ThreadId>,
    pub(crate) completion: Completion,
    pub(crate) cancel: CancellationToken,
}

/// Dependency-driven lazy evaluation scheduler.
///
/// Callers declare nodes with [`prepared`](Solver::prepared),
/// [`prepare`](Solver::prepare) and the `for_all*` builders. Each node runs
/// exactly once on the worker thread, as soon as all of its sources have
/// resolved. [`start`](Solver::start) launches the worker and
/// [`join`](Solver::join) waits for the pass to finish.
///
/// `Solver` is a cheap, cloneable handle; clones share the same graph.
///
/// # Example
///
/// ```rust
/// use solver_core::Solver;
///
/// let solver = Solver::new(());
/// let n1 = solver.prepared(5);
/// let n2 = solver.for_all(&n1).prepare(|v, _| v * 2).unwrap();
///
/// solver.start().unwrap();
/// assert!(solver.join());
/// assert_eq!(*n2.value(), 10);
/// ```
pub struct Solver<Ctx> {
    pub(super) shared: Arc<Shared<Ctx>>,
}

impl<Ctx> Solver<Ctx>
where
    Ctx: Send + Sync + 'static,
{
    /// Create a solver with the default configuration.
    ///
    /// `context` is passed unchanged to every producer.
    pub fn new(context: Ctx) -> Self {
        Self::with_config(context, SolverConfig::default())
    }

    /// Create a solver with the given configuration.
    pub fn with_config(context: Ctx, config: SolverConfig) -> Self {
        let waiting = LinkedList::new();
        let owner = waiting.id();

        Self {
            shared: Arc::new(Shared {
                context,
                config,
                owner,
                graph: Mutex::new(Graph { waiting }),
                ready: ReadyQueue::new(),
                joining: AtomicBool::new(false),
                started: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                handles: AtomicUsize::new(1),
                worker: OnceLock::new(),
                completion: Completion::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Get the shared analysis context.
    pub fn context(&self) -> &Ctx {
        &self.shared.context
    }

    /// Get the solver's configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.shared.config
    }

    /// Declare a node whose value is already known.
    pub fn prepared<T>(&self, value: T) -> Edge<T>
    where
        T: Send + Sync + 'static,
    {
        self.prepare(move |_| value)
    }

    /// Declare a node with no dependencies. It is ready immediately.
    pub fn prepare<T, F>(&self, producer: F) -> Edge<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&Ctx) -> T + Send + 'static,
    {
        let producer: Producer<Ctx> = Box::new(move |ctx: &Ctx| -> Result<Value, ProducerError> {
            Ok(Box::new(producer(ctx)))
        });
        Edge::new(self.register(&[], SourceIds::new(), producer))
    }

    /// Declare a node with no dependencies whose producer may fail.
    ///
    /// A failing producer aborts the pass.
    pub fn try_prepare<T, E, F>(&self, producer: F) -> Edge<T>
    where
        T: Send + Sync + 'static,
        E: Into<ProducerError>,
        F: FnOnce(&Ctx) -> Result<T, E> + Send + 'static,
    {
        let producer: Producer<Ctx> = Box::new(move |ctx: &Ctx| -> Result<Value, ProducerError> {
            let value = producer(ctx).map_err(Into::<ProducerError>::into)?;
            Ok(Box::new(value))
        });
        Edge::new(self.register(&[], SourceIds::new(), producer))
    }

    /// Start declaring a node that depends on `a`.
    pub fn for_all<A>(&self, a: &Edge<A>) -> ForAll<'_, Ctx, A>
    where
        A: Send + Sync + 'static,
    {
        ForAll::new(self, a.clone())
    }

    /// Start declaring a node that depends on `a` and `b`.
    pub fn for_all2<A, B>(&self, a: &Edge<A>, b: &Edge<B>) -> ForAll2<'_, Ctx, A, B>
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
    {
        ForAll2::new(self, a.clone(), b.clone())
    }

    /// Start declaring a node that depends on `a`, `b` and `c`.
    pub fn for_all3<A, B, C>(
        &self,
        a: &Edge<A>,
        b: &Edge<B>,
        c: &Edge<C>,
    ) -> ForAll3<'_, Ctx, A, B, C>
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        ForAll3::new(self, a.clone(), b.clone(), c.clone())
    }

    /// Start declaring a node that depends on any number of same-typed edges.
    pub fn for_all_of<T, I>(&self, edges: I) -> ForAllOf<'_, Ctx, T>
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = Edge<T>>,
    {
        ForAllOf::new(self, edges.into_iter().collect())
    }

    /// Check `sources` and return their ids.
    ///
    /// Fails on a repeated source or a source owned by another solver. Nothing
    /// is registered on failure.
    pub(crate) fn validate(&self, sources: &[Arc<NodeCore>]) -> Result<SourceIds, SolverError> {
        let mut ids = SourceIds::with_capacity(sources.len());
        for source in sources {
            if source.owner() != self.shared.owner {
                return Err(SolverError::ForeignEdge { node: source.id() });
            }
            if ids.contains(&source.id()) {
                return Err(SolverError::DuplicateDependency { node: source.id() });
            }
            ids.push(source.id());
        }
        Ok(ids)
    }

    /// Create a node, register it with its sources, and place it in the ready
    /// queue or the waiting set.
    pub(crate) fn register(
        &self,
        sources: &[Arc<NodeCore>],
        ids: SourceIds,
        producer: Producer<Ctx>,
    ) -> Arc<NodeCore> {
        let node = NodeCore::new(self.shared.owner, ids);
        let mut graph = self.shared.graph.lock();

        for source in sources {
            // A source that resolved before we got the lock will never
            // promote us, so count it now.
            if !source.attach_consumer(&node) {
                node.record_resolved(source.id());
            }
        }

        if self.shared.completion.is_resolved() {
            warn!(node = ?node.id(), "node declared after the pass finished; it will not run");
        }

        let task = Task::new(Arc::clone(&node), producer);
        if node.resolved_source_count() == node.sources().len() {
            trace!(node = ?node.id(), sources = node.sources().len(), "node ready");
            self.shared.ready.push(task);
        } else {
            trace!(
                node = ?node.id(),
                sources = node.sources().len(),
                resolved = node.resolved_source_count(),
                "node waiting"
            );
            let handle = graph.waiting.push_back(task);
            node.set_waiting(handle);
        }

        node
    }

    /// Launch the worker thread.
    ///
    /// The worker is detached; it never keeps the process alive.
    pub fn start(&self) -> Result<(), SolverError> {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return Err(SolverError::AlreadyStarted);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.shared.config.worker_name.clone())
            .spawn(move || shared.run_worker());

        match spawned {
            Ok(_detached) => {
                debug!(solver = ?self.shared.owner, "solver worker started");
                Ok(())
            }
            Err(err) => {
                self.shared.started.store(false, Ordering::SeqCst);
                Err(SolverError::Spawn(err))
            }
        }
    }

    /// Finish the pass and wait for it.
    ///
    /// Returns true if the ready queue drained, false if the pass aborted.
    /// Starts the worker first if [`start`](Solver::start) was never called.
    ///
    /// # Panics
    ///
    /// Panics when called from a producer. The worker would otherwise wait on
    /// itself; with `catch_panics` set the pass aborts as
    /// [`AbortReason::ProducerPanicked`].
    pub fn join(&self) -> bool {
        self.join_outcome().is_solved()
    }

    /// Like [`join`](Solver::join), returning the full [`Outcome`].
    pub fn join_outcome(&self) -> Outcome {
        self.begin_join();
        self.shared.completion.wait()
    }

    /// Like [`join_outcome`](Solver::join_outcome), without blocking the
    /// async runtime.
    pub async fn join_async(&self) -> Outcome {
        self.begin_join();
        self.shared.completion.wait_async().await
    }

    fn begin_join(&self) {
        if self.shared.worker.get() == Some(&thread::current().id()) {
            error!(solver = ?self.shared.owner, "join called from a producer");
            panic!("cannot join a solver from its own worker thread");
        }

        if !self.is_started() {
            warn!(solver = ?self.shared.owner, "join called before start; starting worker");
            match self.start() {
                Ok(()) | Err(SolverError::AlreadyStarted) => {}
                Err(err) => {
                    error!(solver = ?self.shared.owner, error = %err, "cannot start solver worker");
                    self.shared
                        .completion
                        .resolve(Outcome::Aborted(AbortReason::Interrupted));
                }
            }
        }

        if !self.shared.joining.swap(true, Ordering::AcqRel) {
            debug!(solver = ?self.shared.owner, "solver joining");
        }
    }

    /// Token observed by the worker. Hand clones to whoever may cancel.
    pub fn cancel_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    /// Cancel the pass.
    pub fn cancel(&self) {
        debug!(solver = ?self.shared.owner, "solver cancelled");
        self.shared.cancel.cancel();
    }

    /// Check if the worker was started.
    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::SeqCst)
    }

    /// Check if `join` was called.
    pub fn is_joining(&self) -> bool {
        self.shared.joining.load(Ordering::Acquire)
    }

    /// Check if the pass has finished, either way.
    pub fn is_finished(&self) -> bool {
        self.shared.completion.is_resolved()
    }

    /// The outcome, if the pass has finished.
    pub fn outcome(&self) -> Option<Outcome> {
        self.shared.completion.peek()
    }

    /// Number of nodes waiting for sources.
    pub fn waiting_len(&self) -> usize {
        self.shared.graph.lock().waiting.len()
    }

    /// Number of nodes ready to run.
    pub fn ready_len(&self) -> usize {
        self.shared.ready.len()
    }
}

impl<Ctx> Clone for Solver<Ctx> {
    fn clone(&self) -> Self {
        self.shared.handles.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<Ctx> Drop for Solver<Ctx> {
    fn drop(&mut self) {
        if self.shared.handles.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.shutdown.store(true, Ordering::Release);
        }
    }
}

impl<Ctx> std::fmt::Debug for Solver<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("owner", &self.shared.owner)
            .field("started", &self.shared.started.load(Ordering::SeqCst))
            .field("joining", &self.shared.joining.load(Ordering::Acquire))
            .field("ready", &self.shared.ready.len())
            .finish()
    }
}
