//! Solver
//!
//! This module implements the scheduler that resolves interdependent facts
//! lazily.
//!
//! # Concepts
//!
//! ## Declaring Nodes
//!
//! Callers declare nodes incrementally, from any thread, as they discover
//! facts worth computing. A node names its sources up front and supplies a
//! producer that receives the sources' values plus the shared context.
//!
//! ## Ready and Waiting
//!
//! A node with every source resolved goes straight to the ready queue.
//! Otherwise it sits in the waiting set until the last of its sources
//! resolves and promotes it.
//!
//! ## The Pass
//!
//! [`Solver::start`] launches one worker thread that runs ready nodes one at
//! a time. [`Solver::join`] tells the worker to finish what is runnable and
//! waits for the result.
//!
//! # Failure
//!
//! A producer error or panic, a cancellation, or the loss of every solver
//! handle aborts the pass. Nothing is retried; `join` returns false and the
//! caller decides whether to proceed with the nodes that did resolve.

mod builder;
mod cancel;
mod completion;
mod queue;
mod runtime;
mod worker;

pub use builder::{ForAll, ForAll2, ForAll3, ForAllOf};
pub use cancel::CancellationToken;
pub use completion::Outcome;
pub use runtime::Solver;
