//! Solver configuration.

use std::time::Duration;

/// Default bounded wait on the ready queue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default worker thread name.
pub const DEFAULT_WORKER_NAME: &str = "solver-worker";

/// Tunables for a [`Solver`](crate::Solver).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use solver_core::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_poll_interval(Duration::from_millis(5))
///     .with_worker_name("analysis-worker");
/// assert_eq!(config.worker_name, "analysis-worker");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// How long the worker blocks on an empty ready queue before it re-checks
    /// cancellation and the joining flag. Not a per-node deadline.
    pub poll_interval: Duration,

    /// Name given to the worker thread.
    pub worker_name: String,

    /// Convert producer panics into an aborted pass. When disabled, a panic
    /// unwinds the worker thread and the pass reports an interruption.
    pub catch_panics: bool,
}

impl SolverConfig {
    /// Set the ready-queue poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the worker thread name.
    pub fn with_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    /// Enable or disable catching producer panics.
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            catch_panics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.worker_name, DEFAULT_WORKER_NAME);
        assert!(config.catch_panics);
    }

    #[test]
    fn builder_overrides() {
        let config = SolverConfig::default()
            .with_poll_interval(Duration::from_millis(1))
            .with_catch_panics(false);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert!(!config.catch_panics);
    }
}
