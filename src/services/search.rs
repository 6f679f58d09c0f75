//! Per-core stability-boundary search.
//!
//! Drives one core at a time from 0 mV toward the platform limit,
//! recording the boundary where failure first occurs. Every risky apply
//! is preceded by a durable crash record and followed by its removal
//! once the outcome is decided, so an unclean exit always lands on the
//! recovery path at next startup.

use crate::domain::models::{
    CoreOffsets, CrashState, PersistedConfig, SearchConfig, SearchStrategy, NUM_CORES,
};
use crate::domain::ports::events::ProgressUpdate;
use crate::domain::ports::{CrashStateStore, OffsetApplier, StabilityProber, TuneEventSink};
use crate::domain::ports::prober::ProbeRequest;
use crate::services::apply_plan::build_apply_offsets;
use crate::services::cancel::CancelFlag;
use crate::services::progress::EtaEstimator;
use crate::services::sequence::{step_sequence, step_sequence_from};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Extra time a prober invocation is allowed beyond the configured test
/// duration before it is force-terminated and counted as a failure.
const PROBE_GRACE: Duration = Duration::from_secs(10);

/// Outcome of searching one core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSearchOutcome {
    /// Most aggressive offset confirmed stable for the core.
    pub max_stable: i32,
    /// Stability tests run for the core (linear plus refinement).
    pub iterations: u32,
    /// First offset that failed, if any failure was observed.
    pub failed_value: Option<i32>,
    /// True when cancellation interrupted the core's search.
    pub cancelled: bool,
}

enum TestVerdict {
    Pass,
    Fail,
}

/// The stepping / binary-search state machine for a session.
///
/// Owns the session-mutable search state (confirmed-stable vector,
/// known-bad values, ETA samples); the orchestrator feeds it cores in
/// order and reads the accumulated state back out for the final report.
pub struct SearchController {
    applier: Arc<dyn OffsetApplier>,
    prober: Arc<dyn StabilityProber>,
    store: Arc<dyn CrashStateStore>,
    events: Arc<dyn TuneEventSink>,
    config: SearchConfig,
    safe_limit: i32,
    cancel: CancelFlag,
    initial: CoreOffsets,
    stable: CoreOffsets,
    failed_values: BTreeMap<usize, Vec<i32>>,
    eta: EtaEstimator,
}

impl SearchController {
    /// Create a controller for a fresh session.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        applier: Arc<dyn OffsetApplier>,
        prober: Arc<dyn StabilityProber>,
        store: Arc<dyn CrashStateStore>,
        events: Arc<dyn TuneEventSink>,
        config: SearchConfig,
        safe_limit: i32,
        initial: CoreOffsets,
        cancel: CancelFlag,
    ) -> Self {
        let iterations_per_core = step_sequence(config.step_size(), safe_limit).len() as u32;
        let eta = EtaEstimator::new(
            config.test_duration_secs(),
            iterations_per_core,
            NUM_CORES as u32,
        );
        Self {
            applier,
            prober,
            store,
            events,
            config,
            safe_limit,
            cancel,
            initial,
            stable: initial,
            failed_values: BTreeMap::new(),
            eta,
        }
    }

    /// Seed search state from a crash-recovery plan.
    pub fn restore_progress(
        &mut self,
        stable: CoreOffsets,
        failed_values: BTreeMap<usize, Vec<i32>>,
    ) {
        self.stable = stable;
        self.failed_values = failed_values;
    }

    /// Best confirmed-stable vector so far.
    pub const fn stable_offsets(&self) -> CoreOffsets {
        self.stable
    }

    /// Known-bad values per core.
    pub const fn failed_values(&self) -> &BTreeMap<usize, Vec<i32>> {
        &self.failed_values
    }

    /// Last failed value recorded for a core, if any.
    pub fn last_failed(&self, core: usize) -> Option<i32> {
        self.failed_values.get(&core).and_then(|v| v.last()).copied()
    }

    /// Search one core, starting from `start_value` (0 for a fresh core,
    /// the resume value for a recovered one).
    pub async fn seek_core(&mut self, core: usize, start_value: i32) -> CoreSearchOutcome {
        let sequence = step_sequence_from(self.config.step_size(), self.safe_limit, start_value);
        let limit_term = match sequence.last() {
            Some(term) => *term,
            None => {
                return CoreSearchOutcome {
                    max_stable: self.stable.get(core),
                    iterations: 0,
                    failed_value: None,
                    cancelled: false,
                }
            }
        };

        info!(core, start_value, "starting boundary search");

        let mut iterations = 0;
        let mut failed_value = None;

        for value in sequence {
            if self.cancel.is_cancelled() {
                info!(core, "search cancelled");
                return self.cancelled_outcome(core, iterations, failed_value);
            }

            iterations += 1;
            match self.run_one_test(core, value, iterations).await {
                TestVerdict::Pass => {
                    self.stable = self.stable.with(core, value);
                    debug!(core, value, "offset passed");
                    if value == limit_term {
                        info!(core, value, "platform limit reached");
                        break;
                    }
                }
                TestVerdict::Fail => {
                    failed_value = Some(value);
                    info!(core, value, last_good = self.stable.get(core), "offset failed");
                    break;
                }
            }
        }

        if self.config.strategy() == SearchStrategy::LinearThenBinary {
            if let Some(first_fail) = failed_value {
                iterations += self.refine_core(core, first_fail, iterations).await;
            }
        }

        if self.cancel.is_cancelled() {
            return self.cancelled_outcome(core, iterations, failed_value);
        }

        CoreSearchOutcome {
            max_stable: self.stable.get(core),
            iterations,
            failed_value,
            cancelled: false,
        }
    }

    /// Binary-search refinement of the `[last_good, first_fail]` bracket.
    ///
    /// Returns the number of additional tests run. The confirmed-stable
    /// vector always holds the best passing midpoint on exit, including
    /// after a final failing test.
    async fn refine_core(&mut self, core: usize, first_fail: i32, base_iteration: u32) -> u32 {
        let mut low = first_fail;
        let mut high = self.stable.get(core);
        let tolerance = self.config.refine_tolerance();

        if high - low <= tolerance {
            return 0;
        }

        info!(core, low, high, tolerance, "refining bracket");

        let mut extra = 0;
        while high - low > tolerance && extra < self.config.refine_iteration_cap() {
            if self.cancel.is_cancelled() {
                break;
            }

            extra += 1;
            let mid = (low + high).div_euclid(2);
            match self.run_one_test(core, mid, base_iteration + extra).await {
                TestVerdict::Pass => {
                    self.stable = self.stable.with(core, mid);
                    high = mid;
                    debug!(core, mid, "midpoint passed");
                }
                TestVerdict::Fail => {
                    low = mid;
                    debug!(core, mid, "midpoint failed");
                }
            }
        }

        extra
    }

    /// Run the full risky-apply protocol for one candidate value:
    /// progress event, durable crash record, hardware apply, bounded
    /// probe, then record removal once the outcome is decided. A failing
    /// outcome restores the core's previous stable value first.
    async fn run_one_test(&mut self, core: usize, value: i32, iteration: u32) -> TestVerdict {
        self.emit_progress(core, value, iteration).await;
        self.persist_crash_state(core, value).await;

        let offsets =
            build_apply_offsets(core, value, &self.stable, &self.initial).clamped(self.safe_limit);

        debug!(core, value, %offsets, "applying test vector");
        if let Err(err) = self.applier.apply(offsets).await {
            warn!(core, value, error = %err, "apply rejected; treating as test failure");
            return self.fail(core, value).await;
        }

        let verdict = self.probe_bounded(core, offsets).await;
        match verdict {
            TestVerdict::Pass => {
                self.clear_crash_state().await;
                TestVerdict::Pass
            }
            TestVerdict::Fail => self.fail(core, value).await,
        }
    }

    /// Invoke the prober with the hard `duration + grace` deadline.
    async fn probe_bounded(&mut self, core: usize, offsets: CoreOffsets) -> TestVerdict {
        let duration = self.config.test_duration();
        let request = ProbeRequest {
            offsets,
            core_under_test: Some(core),
            duration,
            pulse: self.config.pulse(),
        };

        let started = Instant::now();
        let verdict = match timeout(duration + PROBE_GRACE, self.prober.probe(request)).await {
            Ok(Ok(report)) => {
                if report.hardware_fault {
                    warn!(core, log = %report.log, "hardware fault during probe");
                }
                if report.is_stable() {
                    TestVerdict::Pass
                } else {
                    TestVerdict::Fail
                }
            }
            Ok(Err(err)) => {
                warn!(core, error = %err, "probe error; treating as failure");
                TestVerdict::Fail
            }
            Err(_) => {
                warn!(
                    core,
                    grace_secs = PROBE_GRACE.as_secs(),
                    "probe exceeded deadline; terminating"
                );
                self.prober.cancel();
                TestVerdict::Fail
            }
        };
        self.eta.record_test(started.elapsed());
        verdict
    }

    /// Record a failed value, roll the core back to its previous stable
    /// value, and remove the crash record.
    async fn fail(&mut self, core: usize, value: i32) -> TestVerdict {
        self.failed_values.entry(core).or_default().push(value);

        let restore = build_apply_offsets(core, self.stable.get(core), &self.stable, &self.initial)
            .clamped(self.safe_limit);
        info!(core, value, %restore, "restoring last-known-good vector");
        if let Err(err) = self.applier.apply(restore).await {
            warn!(core, error = %err, "rollback apply failed");
        }

        self.clear_crash_state().await;
        TestVerdict::Fail
    }

    async fn persist_crash_state(&self, core: usize, value: i32) {
        let state = CrashState::for_test(
            core,
            value,
            self.stable.as_array(),
            self.failed_values.clone(),
            PersistedConfig {
                step_size: self.config.step_size(),
                test_duration: self.config.test_duration_secs(),
                safety_margin: self.config.safety_margin(),
            },
        );
        if let Err(err) = self.store.persist(&state).await {
            warn!(core, value, error = %err, "failed to persist crash record");
        }
    }

    async fn clear_crash_state(&self) {
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear crash record");
        }
    }

    async fn emit_progress(&self, core: usize, value: i32, iteration: u32) {
        self.events
            .progress(ProgressUpdate {
                core,
                value,
                iteration,
                eta_seconds: self.eta.eta_seconds(core, iteration),
                percent: self.eta.percent_complete(),
                core_results: self.stable.as_array(),
            })
            .await;
    }

    fn cancelled_outcome(
        &self,
        core: usize,
        iterations: u32,
        failed_value: Option<i32>,
    ) -> CoreSearchOutcome {
        CoreSearchOutcome {
            max_stable: self.stable.get(core),
            iterations,
            failed_value,
            cancelled: true,
        }
    }
}
