//! Solver Core
//!
//! This crate provides a dependency-driven lazy evaluation scheduler, used to
//! resolve interdependent semantic facts during SQL analysis without computing
//! everything up front or in a fixed order.
//!
//! It implements:
//!
//! - A handle-addressed linked list with O(1) removal of arbitrary elements
//! - Nodes of lazy computation with typed edges between them
//! - A solver that runs each node exactly once, on a single worker thread, as
//!   soon as all of its dependencies have resolved
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `list`: The waiting-set container
//! - `graph`: Nodes, edges, and runnable tasks
//! - `solver`: Combinators, the ready queue, and the worker loop
//! - `config`: Solver tunables
//! - `error`: Error and abort types
//!
//! # Example
//!
//! ```rust
//! use solver_core::Solver;
//!
//! struct Catalog {
//!     default_schema: &'static str,
//! }
//!
//! let solver = Solver::new(Catalog { default_schema: "public" });
//!
//! let table = solver.prepared("orders");
//! let schema = solver.prepare(|catalog: &Catalog| catalog.default_schema);
//! let qualified = solver
//!     .for_all2(&schema, &table)
//!     .prepare(|schema, table, _| format!("{schema}.{table}"))
//!     .unwrap();
//!
//! solver.start().unwrap();
//! assert!(solver.join());
//! assert_eq!(qualified.value(), "public.orders");
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod list;
pub mod solver;

pub use config::SolverConfig;
pub use error::{AbortReason, ProducerError, SolverError};
pub use graph::{Edge, NodeId};
pub use solver::{CancellationToken, ForAll, ForAll2, ForAll3, ForAllOf, Outcome, Solver};
