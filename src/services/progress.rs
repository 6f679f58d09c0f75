//! Progress and ETA estimation.
//!
//! ETA is derived from observed test durations and the remaining
//! iteration count; it feeds the event side channel only and has no
//! bearing on search correctness.

use std::time::Duration;

/// Rolling estimator for remaining session time and completion percent.
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    configured_test_secs: u64,
    iterations_per_core: u32,
    total_cores: u32,
    observed: Vec<Duration>,
    completed_iterations: u32,
}

impl EtaEstimator {
    /// Create an estimator for a session.
    ///
    /// `iterations_per_core` is the length of the stepping sequence;
    /// actual cores usually finish earlier (first failure stops a core),
    /// so the estimate is conservative.
    pub fn new(configured_test_secs: u64, iterations_per_core: u32, total_cores: u32) -> Self {
        Self {
            configured_test_secs,
            iterations_per_core,
            total_cores,
            observed: Vec::new(),
            completed_iterations: 0,
        }
    }

    /// Record one finished test.
    pub fn record_test(&mut self, elapsed: Duration) {
        self.observed.push(elapsed);
        self.completed_iterations += 1;
    }

    /// Average observed test duration, falling back to the configured
    /// duration before any sample exists.
    fn average_test_secs(&self) -> f64 {
        if self.observed.is_empty() {
            return self.configured_test_secs as f64;
        }
        let total: f64 = self.observed.iter().map(Duration::as_secs_f64).sum();
        total / self.observed.len() as f64
    }

    /// Estimated seconds remaining, given the core currently being
    /// tested and the 1-based iteration within it.
    pub fn eta_seconds(&self, current_core: usize, current_iteration: u32) -> u64 {
        let remaining_cores = self
            .total_cores
            .saturating_sub(current_core as u32)
            .saturating_sub(1);
        let remaining_in_core = self.iterations_per_core.saturating_sub(current_iteration);
        let remaining = remaining_cores * self.iterations_per_core + remaining_in_core;
        (f64::from(remaining) * self.average_test_secs()).round() as u64
    }

    /// Fraction of the session completed, in `[0.0, 1.0]`.
    pub fn percent_complete(&self) -> f64 {
        let total = self.total_cores * self.iterations_per_core;
        if total == 0 {
            return 1.0;
        }
        (f64::from(self.completed_iterations) / f64::from(total)).min(1.0)
    }
}
