//! Integration Tests for the Solver
//!
//! These tests drive whole passes: declaring nodes, running the worker, and
//! observing values, ordering, and outcomes.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use solver_core::{AbortReason, Edge, Outcome, Solver, SolverConfig, SolverError};

/// Records the order in which producers ran.
#[derive(Default)]
struct Trace {
    events: Mutex<Vec<&'static str>>,
    calls: AtomicI32,
}

impl Trace {
    fn record(&self, event: &'static str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.events.lock().push(event);
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }

    fn position(&self, event: &str) -> usize {
        self.events()
            .iter()
            .position(|e| *e == event)
            .unwrap_or_else(|| panic!("{event} never ran"))
    }
}

fn fast_config() -> SolverConfig {
    SolverConfig::default().with_poll_interval(Duration::from_millis(1))
}

/// The canonical scenario: a prepared value doubled by a dependent node.
#[test]
fn prepared_value_feeds_dependent() {
    let solver = Solver::new(());
    let n1 = solver.prepared(5);
    let n2 = solver.for_all(&n1).prepare(|v, _| v * 2).unwrap();

    solver.start().unwrap();
    assert!(solver.join());

    assert_eq!(*n1.value(), 5);
    assert_eq!(*n2.value(), 10);
}

/// A zero-source node needs nothing else to resolve.
#[test]
fn zero_source_node_resolves() {
    let solver = Solver::new(());
    let answer = solver.prepare(|_| 42);

    solver.start().unwrap();
    assert!(solver.join());
    assert_eq!(answer.try_value().ok(), Some(&42));
}

/// Chain A -> B -> C runs strictly in dependency order.
#[test]
fn chain_runs_in_dependency_order() {
    let solver = Solver::with_config(Trace::default(), fast_config());

    let a = solver.prepare(|trace: &Trace| {
        trace.record("a");
        1
    });
    let b = solver
        .for_all(&a)
        .prepare(|a, trace: &Trace| {
            trace.record("b");
            a + 1
        })
        .unwrap();
    let c = solver
        .for_all(&b)
        .prepare(|b, trace: &Trace| {
            trace.record("c");
            b + 1
        })
        .unwrap();

    solver.start().unwrap();
    assert!(solver.join());

    assert_eq!(solver.context().events(), vec!["a", "b", "c"]);
    assert_eq!(*c.value(), 3);
}

/// D depends on B and C, which both depend on A. D runs once, after both.
#[test]
fn diamond_runs_join_node_once() {
    let solver = Solver::with_config(Trace::default(), fast_config());

    let a = solver.prepare(|trace: &Trace| {
        trace.record("a");
        10
    });
    let b = solver
        .for_all(&a)
        .prepare(|a, trace: &Trace| {
            trace.record("b");
            a + 1
        })
        .unwrap();
    let c = solver
        .for_all(&a)
        .prepare(|a, trace: &Trace| {
            trace.record("c");
            a + 2
        })
        .unwrap();
    let d = solver
        .for_all2(&b, &c)
        .prepare(|b, c, trace: &Trace| {
            trace.record("d");
            b * c
        })
        .unwrap();

    solver.start().unwrap();
    assert!(solver.join());

    let trace = solver.context();
    assert_eq!(*d.value(), 11 * 12);
    assert_eq!(trace.calls.load(Ordering::SeqCst), 4);
    assert!(trace.position("a") < trace.position("b"));
    assert!(trace.position("a") < trace.position("c"));
    assert!(trace.position("b") < trace.position("d"));
    assert!(trace.position("c") < trace.position("d"));
}

/// Nodes declared while the worker is already running still get solved.
#[test]
fn declaring_after_start_works() {
    let solver = Solver::with_config((), fast_config());
    solver.start().unwrap();

    let a = solver.prepared(2);
    thread::sleep(Duration::from_millis(5));
    let b = solver.for_all(&a).prepare(|a, _| a * 3).unwrap();

    assert!(solver.join());
    assert_eq!(*b.value(), 6);
}

/// Many threads declare overlapping graphs concurrently with the worker.
#[test]
fn concurrent_declarations_resolve_exactly_once() {
    let calls = Arc::new(AtomicI32::new(0));
    let solver = Solver::with_config(Arc::clone(&calls), fast_config());
    solver.start().unwrap();

    let root = solver.prepare(|calls: &Arc<AtomicI32>| {
        calls.fetch_add(1, Ordering::SeqCst);
        1_i64
    });

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let solver = solver.clone();
            let root = root.clone();
            thread::spawn(move || {
                let mut leaves = Vec::new();
                for j in 0..50_i64 {
                    let left = solver
                        .for_all(&root)
                        .prepare(move |r, calls: &Arc<AtomicI32>| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            r + j
                        })
                        .unwrap();
                    let right = solver
                        .for_all(&root)
                        .prepare(move |r, calls: &Arc<AtomicI32>| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            r + i
                        })
                        .unwrap();
                    let join = solver
                        .for_all2(&left, &right)
                        .prepare(|l, r, calls: &Arc<AtomicI32>| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            l + r
                        })
                        .unwrap();
                    leaves.push((j, join));
                }
                leaves
            })
        })
        .collect();

    let leaves: Vec<(i64, i64, Edge<i64>)> = workers
        .into_iter()
        .enumerate()
        .flat_map(|(i, handle)| {
            handle
                .join()
                .unwrap()
                .into_iter()
                .map(move |(j, edge)| (i as i64, j, edge))
        })
        .collect();

    assert!(solver.join());

    assert_eq!(calls.load(Ordering::SeqCst), 1 + 8 * 50 * 3);
    for (i, j, edge) in &leaves {
        assert_eq!(*edge.value(), (1 + j) + (1 + i));
    }
}

/// The variadic builder hands values over in declaration order.
#[test]
fn variadic_builder_preserves_order() {
    let solver = Solver::new(());
    let columns: Vec<Edge<&'static str>> = ["id", "name", "email"]
        .into_iter()
        .map(|c| solver.prepared(c))
        .collect();

    let select = solver
        .for_all_of(columns.iter().cloned())
        .prepare(|cols, _| cols.iter().map(|c| **c).collect::<Vec<_>>().join(", "))
        .unwrap();

    solver.start().unwrap();
    assert!(solver.join());
    assert_eq!(select.value(), "id, name, email");
}

/// A three-way join sees all of its inputs.
#[test]
fn three_source_node_sees_all_values() {
    let solver = Solver::new(10_u64);
    let a = solver.prepared(1_u64);
    let b = solver.prepared(2_u64);
    let c = solver.prepared(3_u64);

    let sum = solver
        .for_all3(&a, &b, &c)
        .prepare(|a, b, c, base: &u64| base + a + b + c)
        .unwrap();

    solver.start().unwrap();
    assert!(solver.join());
    assert_eq!(*sum.value(), 16);
}

/// Listing the same source twice fails before anything is queued.
#[test]
fn duplicate_dependency_fails_at_construction() {
    let solver = Solver::new(());
    let a = solver.prepared(1);

    let err = solver
        .for_all_of(vec![a.clone(), a.clone()])
        .prepare(|values, _| values.len())
        .unwrap_err();

    assert!(matches!(err, SolverError::DuplicateDependency { node } if node == a.id()));
    assert_eq!(solver.waiting_len(), 0);

    solver.start().unwrap();
    assert!(solver.join());
}

/// Cancelling before join aborts the pass and runs nothing further.
#[test]
fn cancellation_before_join_aborts() {
    let solver = Solver::with_config(Trace::default(), fast_config());
    let token = solver.cancel_token();

    let a = solver.prepare(|trace: &Trace| {
        trace.record("a");
        1
    });
    let b = solver
        .for_all(&a)
        .prepare(|a, trace: &Trace| {
            trace.record("b");
            a + 1
        })
        .unwrap();

    token.cancel();
    solver.start().unwrap();

    assert!(!solver.join());
    assert_eq!(solver.outcome(), Some(Outcome::Aborted(AbortReason::Cancelled)));
    assert!(solver.context().events().is_empty());
    assert!(!a.is_resolved());
    assert!(!b.is_resolved());
    assert_eq!(solver.waiting_len(), 0);
    assert_eq!(solver.ready_len(), 0);
}

/// Cancelling from inside a producer stops the rest of the pass.
#[test]
fn cancellation_mid_pass_stops_later_nodes() {
    let solver = Solver::with_config(Trace::default(), fast_config());
    let token = solver.cancel_token();

    let a = solver.prepare(move |trace: &Trace| {
        trace.record("a");
        token.cancel();
        1
    });
    let b = solver
        .for_all(&a)
        .prepare(|a, trace: &Trace| {
            trace.record("b");
            a + 1
        })
        .unwrap();

    solver.start().unwrap();
    assert!(!solver.join());

    assert_eq!(solver.context().events(), vec!["a"]);
    assert!(a.is_resolved());
    assert!(!b.is_resolved());
}

/// A producer returning an error aborts the pass.
#[test]
fn failing_producer_aborts_pass() {
    let solver = Solver::with_config((), fast_config());
    let table = solver.try_prepare(|_| Err::<i32, _>("table `orders` not found"));
    let columns = solver.for_all(&table).prepare(|t, _| t + 1).unwrap();

    solver.start().unwrap();
    let outcome = solver.join_outcome();

    match outcome {
        Outcome::Aborted(AbortReason::ProducerFailed { node, message }) => {
            assert_eq!(node, table.id());
            assert_eq!(message, "table `orders` not found");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!columns.is_resolved());
}

/// A fallible dependent producer that succeeds behaves like `prepare`.
#[test]
fn fallible_dependent_producer_succeeds() {
    let solver = Solver::new(());
    let raw = solver.prepared("42".to_string());
    let parsed = solver
        .for_all(&raw)
        .try_prepare(|raw, _| raw.parse::<i32>())
        .unwrap();

    solver.start().unwrap();
    assert!(solver.join());
    assert_eq!(*parsed.value(), 42);
}

/// A panicking producer aborts the pass instead of hanging `join`.
#[test]
fn panicking_producer_aborts_pass() {
    let solver = Solver::with_config((), fast_config());
    let boom: Edge<i32> = solver.prepare(|_| panic!("unexpected token"));

    solver.start().unwrap();
    let outcome = solver.join_outcome();

    assert_eq!(
        outcome,
        Outcome::Aborted(AbortReason::ProducerPanicked {
            node: boom.id(),
            message: "unexpected token".to_string(),
        })
    );
}

/// With panic catching disabled, the unwinding worker still resolves `join`.
#[test]
fn uncaught_panic_reports_interruption() {
    let config = fast_config().with_catch_panics(false);
    let solver = Solver::with_config((), config);
    let _boom: Edge<i32> = solver.prepare(|_| panic!("worker goes down"));

    solver.start().unwrap();
    assert_eq!(
        solver.join_outcome(),
        Outcome::Aborted(AbortReason::Interrupted)
    );
}

/// A fully resolvable graph abandons nothing.
#[test]
fn solved_outcome_lists_no_abandoned_nodes() {
    let solver = Solver::new(());
    let a = solver.prepared(1);
    let _b = solver.for_all(&a).prepare(|a, _| a + 1).unwrap();

    solver.start().unwrap();
    let outcome = solver.join_outcome();
    assert!(outcome.is_solved());
    assert!(outcome.abandoned().is_empty());
    assert!(solver.is_finished());
}

/// Joining twice returns the same outcome.
#[test]
fn join_is_repeatable() {
    let solver = Solver::new(());
    let _a = solver.prepared(1);

    solver.start().unwrap();
    assert!(solver.join());
    assert!(solver.join());
    assert!(solver.is_joining());
}

/// `join_async` resolves without blocking the runtime.
#[tokio::test]
async fn join_async_reports_outcome() {
    let solver = Solver::with_config((), fast_config());
    let a = solver.prepared(3);
    let b = solver.for_all(&a).prepare(|a, _| a * a).unwrap();

    solver.start().unwrap();
    let outcome = solver.join_async().await;

    assert!(outcome.is_solved());
    assert_eq!(*b.value(), 9);
}
