//! Typed dependency builders.
//!
//! `for_all`, `for_all2` and `for_all3` give producers a checked signature for
//! the common one to three dependency cases. `for_all_of` takes any number of
//! edges of one type and hands the producer a slice.

use std::convert::Infallible;
use std::sync::Arc;

use super::runtime::Solver;
use crate::error::{ProducerError, SolverError};
use crate::graph::{Edge, Producer, Value};

/// Builder for a node depending on one edge.
#[must_use = "call `prepare` to declare the node"]
pub struct ForAll<'s, Ctx, A> {
    solver: &'s Solver<Ctx>,
    a: Edge<A>,
}

impl<'s, Ctx, A> ForAll<'s, Ctx, A>
where
    Ctx: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    pub(crate) fn new(solver: &'s Solver<Ctx>, a: Edge<A>) -> Self {
        Self { solver, a }
    }

    /// Declare the node. The producer receives the source's value and the
    /// context.
    pub fn prepare<T, F>(self, producer: F) -> Result<Edge<T>, SolverError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&A, &Ctx) -> T + Send + 'static,
    {
        self.try_prepare(move |a, ctx| Ok::<T, Infallible>(producer(a, ctx)))
    }

    /// Declare the node with a producer that may fail.
    pub fn try_prepare<T, E, F>(self, producer: F) -> Result<Edge<T>, SolverError>
    where
        T: Send + Sync + 'static,
        E: Into<ProducerError>,
        F: FnOnce(&A, &Ctx) -> Result<T, E> + Send + 'static,
    {
        let sources = [Arc::clone(self.a.node())];
        let ids = self.solver.validate(&sources)?;

        let a = self.a;
        let producer: Producer<Ctx> = Box::new(move |ctx: &Ctx| -> Result<Value, ProducerError> {
            let value = producer(a.try_value()?, ctx).map_err(Into::<ProducerError>::into)?;
            Ok(Box::new(value))
        });

        Ok(Edge::new(self.solver.register(&sources, ids, producer)))
    }
}

/// Builder for a node depending on two edges.
#[must_use = "call `prepare` to declare the node"]
pub struct ForAll2<'s, Ctx, A, B> {
    solver: &'s Solver<Ctx>,
    a: Edge<A>,
    b: Edge<B>,
}

impl<'s, Ctx, A, B> ForAll2<'s, Ctx, A, B>
where
    Ctx: Send + Sync + 'static,
    A: Send + Sync + 'static,
    B: Send + Sync + 'static,
{
    pub(crate) fn new(solver: &'s Solver<Ctx>, a: Edge<A>, b: Edge<B>) -> Self {
        Self { solver, a, b }
    }

    /// Declare the node. The producer receives both values, in declaration
    /// order, and the context.
    pub fn prepare<T, F>(self, producer: F) -> Result<Edge<T>, SolverError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&A, &B, &Ctx) -> T + Send + 'static,
    {
        self.try_prepare(move |a, b, ctx| Ok::<T, Infallible>(producer(a, b, ctx)))
    }

    /// Declare the node with a producer that may fail.
    pub fn try_prepare<T, E, F>(self, producer: F) -> Result<Edge<T>, SolverError>
    where
        T: Send + Sync + 'static,
        E: Into<ProducerError>,
        F: FnOnce(&A, &B, &Ctx) -> Result<T, E> + Send + 'static,
    {
        let sources = [Arc::clone(self.a.node()), Arc::clone(self.b.node())];
        let ids = self.solver.validate(&sources)?;

        let (a, b) = (self.a, self.b);
        let producer: Producer<Ctx> = Box::new(move |ctx: &Ctx| -> Result<Value, ProducerError> {
            let value = producer(a.try_value()?, b.try_value()?, ctx)
                .map_err(Into::<ProducerError>::into)?;
            Ok(Box::new(value))
        });

        Ok(Edge::new(self.solver.register(&sources, ids, producer)))
    }
}

/// Builder for a node depending on three edges.
#[must_use = "call `prepare` to declare the node"]
pub struct ForAll3<'s, Ctx, A, B, C> {
    solver: &'s Solver<Ctx>,
    a: Edge<A>,
    b: Edge<B>,
    c: Edge<C>,
}

impl<'s, Ctx, A, B, C> ForAll3<'s, Ctx, A, B, C>
where
    Ctx: Send + Sync + 'static,
    A: Send + Sync + 'static,
    B: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    pub(crate) fn new(solver: &'s Solver<Ctx>, a: Edge<A>, b: Edge<B>, c: Edge<C>) -> Self {
        Self { solver, a, b, c }
    }

    /// Declare the node. The producer receives the three values, in
    /// declaration order, and the context.
    pub fn prepare<T, F>(self, producer: F) -> Result<Edge<T>, SolverError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(&A, &B, &C, &Ctx) -> T + Send + 'static,
    {
        self.try_prepare(move |a, b, c, ctx| Ok::<T, Infallible>(producer(a, b, c, ctx)))
    }

    /// Declare the node with a producer that may fail.
    pub fn try_prepare<T, E, F>(self, producer: F) -> Result<Edge<T>, SolverError>
    where
        T: Send + Sync + 'static,
        E: Into<ProducerError>,
        F: FnOnce(&A, &B, &C, &Ctx) -> Result<T, E> + Send + 'static,
    {
        let sources = [
            Arc::clone(self.a.node()),
            Arc::clone(self.b.node()),
            Arc::clone(self.c.node()),
        ];
        let ids = self.solver.validate(&sources)?;

        let (a, b, c) = (self.a, self.b, self.c);
        let producer: Producer<Ctx> = Box::new(move |ctx: &Ctx| -> Result<Value, ProducerError> {
            let value = producer(a.try_value()?, b.try_value()?, c.try_value()?, ctx)
                .map_err(Into::<ProducerError>::into)?;
            Ok(Box::new(value))
        });

        Ok(Edge::new(self.solver.register(&sources, ids, producer)))
    }
}

/// Builder for a node depending on any number of same-typed edges.
#[must_use = "call `prepare` to declare the node"]
pub struct ForAllOf<'s, Ctx, T> {
    solver: &'s Solver<Ctx>,
    edges: Vec<Edge<T>>,
}

impl<'s, Ctx, T> ForAllOf<'s, Ctx, T>
where
    Ctx: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub(crate) fn new(solver: &'s Solver<Ctx>, edges: Vec<Edge<T>>) -> Self {
        Self { solver, edges }
    }

    /// Declare the node. The producer receives the values in the order the
    /// edges were given.
    pub fn prepare<U, F>(self, producer: F) -> Result<Edge<U>, SolverError>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&[&T], &Ctx) -> U + Send + 'static,
    {
        self.try_prepare(move |values, ctx| Ok::<U, Infallible>(producer(values, ctx)))
    }

    /// Declare the node with a producer that may fail.
    pub fn try_prepare<U, E, F>(self, producer: F) -> Result<Edge<U>, SolverError>
    where
        U: Send + Sync + 'static,
        E: Into<ProducerError>,
        F: FnOnce(&[&T], &Ctx) -> Result<U, E> + Send + 'static,
    {
        let sources: Vec<_> = self.edges.iter().map(|edge| Arc::clone(edge.node())).collect();
        let ids = self.solver.validate(&sources)?;

        let edges = self.edges;
        let producer: Producer<Ctx> = Box::new(move |ctx: &Ctx| -> Result<Value, ProducerError> {
            let values = edges
                .iter()
                .map(Edge::try_value)
                .collect::<Result<Vec<_>, _>>()?;
            let value = producer(&values, ctx).map_err(Into::<ProducerError>::into)?;
            Ok(Box::new(value))
        });

        Ok(Edge::new(self.solver.register(&sources, ids, producer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arities_wait_on_every_source() {
        let solver = Solver::new(());
        let a = solver.prepared(1_u32);
        let b = solver.prepared("b");
        let c = solver.prepared(3.0_f64);

        let _one = solver.for_all(&a).prepare(|a, _| *a).unwrap();
        let _two = solver.for_all2(&a, &b).prepare(|a, b, _| format!("{a}{b}")).unwrap();
        let _three = solver
            .for_all3(&a, &b, &c)
            .prepare(|a, _, c, _| f64::from(*a) + c)
            .unwrap();
        let _many = solver
            .for_all_of([a.clone(), a.clone()].into_iter().take(1))
            .prepare(|values, _| values.len())
            .unwrap();

        assert_eq!(solver.ready_len(), 3);
        assert_eq!(solver.waiting_len(), 4);
    }

    #[test]
    fn variadic_duplicate_is_rejected() {
        let solver = Solver::new(());
        let a = solver.prepared(1);
        let b = solver.prepared(2);

        let result = solver
            .for_all_of(vec![a.clone(), b, a.clone()])
            .prepare(|values, _| values.len());

        assert!(matches!(
            result,
            Err(SolverError::DuplicateDependency { node }) if node == a.id()
        ));
        assert_eq!(solver.waiting_len(), 0);
    }

    #[test]
    fn three_way_duplicate_names_the_repeat() {
        let solver = Solver::new(());
        let a = solver.prepared(1);
        let b = solver.prepared(2);

        let result = solver.for_all3(&a, &b, &b).prepare(|_, _, _, _| ());
        assert!(matches!(
            result,
            Err(SolverError::DuplicateDependency { node }) if node == b.id()
        ));
    }

    #[test]
    fn empty_variadic_is_ready_at_birth() {
        let solver = Solver::new(());
        let _none = solver
            .for_all_of(Vec::<Edge<i32>>::new())
            .prepare(|values, _| values.len())
            .unwrap();

        assert_eq!(solver.ready_len(), 1);
    }
}
