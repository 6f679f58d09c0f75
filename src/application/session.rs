//! Session orchestration.
//!
//! Sequences the four cores through the search controller, aggregates
//! per-core results, and optionally finishes with a whole-system
//! verification pass. Exactly one session may be active at a time;
//! starting a second is rejected, not queued.

use crate::domain::errors::{TuneError, TuneResult};
use crate::domain::models::{
    recommended_offset, CoreOffsets, CoreResult, SearchConfig, SessionResult, NUM_CORES,
};
use crate::domain::ports::prober::ProbeRequest;
use crate::domain::ports::{CrashStateStore, OffsetApplier, StabilityProber, TuneEventSink};
use crate::services::cancel::CancelFlag;
use crate::services::recovery::RecoveryPlan;
use crate::services::search::SearchController;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use tokio::time::{timeout, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Offset every core falls back to when verification fails twice.
const CONSERVATIVE_FALLBACK_MV: i32 = -10;

/// Extra margin added to every core before the verification retry.
const VERIFY_MARGIN_BUMP: i32 = 5;

/// Grace period on top of the verification test duration.
const VERIFY_GRACE_SECS: u64 = 10;

/// Runs complete tuning sessions against a fixed set of collaborators.
///
/// Intended to live in an `Arc`; `cancel` may be called from any task
/// while `run` is in flight.
pub struct SessionOrchestrator {
    applier: Arc<dyn OffsetApplier>,
    prober: Arc<dyn StabilityProber>,
    store: Arc<dyn CrashStateStore>,
    events: Arc<dyn TuneEventSink>,
    safe_limit: i32,
    running: AtomicBool,
    active_cancel: Mutex<Option<CancelFlag>>,
}

/// Releases the single-session guard on every exit path, including
/// panics. The crash record is deliberately left alone here: an unclean
/// exit must be discoverable at next startup.
struct RunGuard<'a> {
    orchestrator: &'a SessionOrchestrator,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.orchestrator.active_cancel.lock().unwrap() = None;
        self.orchestrator.running.store(false, Ordering::SeqCst);
    }
}

impl SessionOrchestrator {
    /// Create an orchestrator.
    ///
    /// `safe_limit` is the platform's most aggressive permitted offset
    /// (negative mV).
    pub fn new(
        applier: Arc<dyn OffsetApplier>,
        prober: Arc<dyn StabilityProber>,
        store: Arc<dyn CrashStateStore>,
        events: Arc<dyn TuneEventSink>,
        safe_limit: i32,
    ) -> Self {
        Self {
            applier,
            prober,
            store,
            events,
            safe_limit,
            running: AtomicBool::new(false),
            active_cancel: Mutex::new(None),
        }
    }

    /// Whether a session is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request cancellation of the active session, if any. The session
    /// restores the pre-session vector and clears the crash record on
    /// its way out.
    pub fn cancel(&self) {
        if let Some(flag) = self.active_cancel.lock().unwrap().as_ref() {
            info!("session cancellation requested");
            flag.cancel();
        }
        self.prober.cancel();
    }

    /// Run a full tuning session.
    ///
    /// `initial` is the vector currently applied to hardware; untested
    /// cores are held at it, and it is restored on cancellation.
    pub async fn run(
        &self,
        config: SearchConfig,
        initial: CoreOffsets,
    ) -> TuneResult<SessionResult> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("rejected session start: one is already running");
            return Err(TuneError::SessionAlreadyRunning);
        }
        let _guard = RunGuard { orchestrator: self };

        let cancel = CancelFlag::new();
        *self.active_cancel.lock().unwrap() = Some(cancel.clone());

        let started = Instant::now();
        let initial = initial.clamped(self.safe_limit);
        let session_id = Uuid::new_v4();
        info!(%session_id, limit = self.safe_limit, "starting tuning session");

        let mut controller = SearchController::new(
            self.applier.clone(),
            self.prober.clone(),
            self.store.clone(),
            self.events.clone(),
            config.clone(),
            self.safe_limit,
            initial,
            cancel.clone(),
        );

        // Consult the crash record before any apply.
        let recovery = self.check_recovery().await;
        let mut start_core = 0usize;
        let mut start_value = 0i32;
        if let Some(plan) = &recovery {
            controller.restore_progress(plan.stable, plan.failed_values.clone());
            start_core = plan.resume.core;
            start_value = plan.resume.value;
        }

        let mut results: Vec<CoreResult> = Vec::with_capacity(NUM_CORES);
        for core in 0..start_core.min(NUM_CORES) {
            // Cores finished before the crash: reconstruct their results
            // from the recovered state. Iteration counts are unknown.
            results.push(CoreResult::from_boundary(
                core,
                controller.stable_offsets().get(core),
                0,
                controller.last_failed(core),
                config.safety_margin(),
            ));
        }

        for core in start_core..NUM_CORES {
            if cancel.is_cancelled() {
                break;
            }
            let from = if core == start_core { start_value } else { 0 };
            let outcome = controller.seek_core(core, from).await;
            if outcome.cancelled {
                break;
            }
            let result = CoreResult::from_boundary(
                core,
                outcome.max_stable,
                outcome.iterations,
                outcome.failed_value,
                config.safety_margin(),
            );
            info!(
                core,
                max_stable = result.max_stable,
                recommended = result.recommended,
                tier = result.quality_tier.as_str(),
                "core search complete"
            );
            self.events.core_complete(&result).await;
            results.push(result);
        }

        let aborted = cancel.is_cancelled();
        if aborted {
            self.rollback_after_cancel(&initial).await;
        }

        // Pad to exactly one result per core for early-stopped sessions.
        for core in results.len()..NUM_CORES {
            results.push(CoreResult::untested(
                core,
                controller.stable_offsets().get(core),
                config.safety_margin(),
            ));
        }

        if config.verify() && !aborted {
            self.verify_results(&config, &mut results).await;
        }

        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear crash record at session end");
        }

        let result = SessionResult {
            id: session_id,
            cores: results,
            duration_secs: started.elapsed().as_secs_f64(),
            recovered: recovery.is_some(),
            aborted,
            finished_at: Utc::now(),
        };
        info!(
            %session_id,
            duration_secs = result.duration_secs,
            recovered = result.recovered,
            aborted = result.aborted,
            "session finished"
        );
        self.events.session_complete(&result).await;
        Ok(result)
    }

    /// Read the crash record once; an active record yields a recovery
    /// plan whose confirmed-safe vector is re-applied to hardware before
    /// any further testing.
    async fn check_recovery(&self) -> Option<RecoveryPlan> {
        let state = match self.store.load().await {
            Ok(state) => state?,
            Err(err) => {
                warn!(error = %err, "crash record unreadable; starting fresh");
                return None;
            }
        };
        if !state.active {
            return None;
        }

        let plan = RecoveryPlan::from_state(state, self.safe_limit);
        if let Err(err) = self.applier.apply(plan.stable.clamped(self.safe_limit)).await {
            error!(error = %err, "failed to restore confirmed-safe vector after crash");
        } else {
            info!(restored = %plan.stable, "restored confirmed-safe vector after crash");
        }
        self.events.recovery(&plan.notice()).await;
        Some(plan)
    }

    /// Restore the pre-session vector and drop the crash record after a
    /// cancellation was observed.
    async fn rollback_after_cancel(&self, initial: &CoreOffsets) {
        info!(restore = %initial, "session cancelled; restoring pre-session vector");
        if let Err(err) = self.applier.apply(*initial).await {
            error!(error = %err, "failed to restore pre-session vector");
        }
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear crash record after cancellation");
        }
    }

    /// Whole-system verification: apply the recommended vector and run
    /// one longer stability test. On failure, widen every core's margin
    /// and retry once; on a second failure, fall back to a fixed
    /// conservative value instead of trusting the search result.
    async fn verify_results(&self, config: &SearchConfig, results: &mut [CoreResult]) {
        let vector = recommended_vector(results).clamped(self.safe_limit);
        info!(%vector, "running verification pass");
        if self.verify_once(config, vector).await {
            return;
        }

        warn!("verification failed; widening safety margin and retrying");
        for result in results.iter_mut() {
            result.recommended = recommended_offset(
                result.max_stable,
                config.safety_margin() + VERIFY_MARGIN_BUMP,
            );
        }
        let vector = recommended_vector(results).clamped(self.safe_limit);
        if self.verify_once(config, vector).await {
            return;
        }

        error!(
            fallback = CONSERVATIVE_FALLBACK_MV,
            "verification failed twice; reverting every core to the conservative value"
        );
        for result in results.iter_mut() {
            result.recommended = CONSERVATIVE_FALLBACK_MV;
        }
        let vector = recommended_vector(results).clamped(self.safe_limit);
        if let Err(err) = self.applier.apply(vector).await {
            error!(error = %err, "failed to apply conservative fallback vector");
        }
    }

    /// One verification attempt: apply the vector and probe it for the
    /// verification duration. Apply failure counts as a failed attempt.
    async fn verify_once(&self, config: &SearchConfig, vector: CoreOffsets) -> bool {
        if let Err(err) = self.applier.apply(vector).await {
            warn!(error = %err, "verification apply rejected");
            return false;
        }

        let duration = config.verify_duration();
        let request = ProbeRequest {
            offsets: vector,
            core_under_test: None,
            duration,
            pulse: config.pulse(),
        };
        let deadline = duration + std::time::Duration::from_secs(VERIFY_GRACE_SECS);
        match timeout(deadline, self.prober.probe(request)).await {
            Ok(Ok(report)) => report.is_stable(),
            Ok(Err(err)) => {
                warn!(error = %err, "verification probe error");
                false
            }
            Err(_) => {
                warn!("verification probe exceeded deadline; terminating");
                self.prober.cancel();
                false
            }
        }
    }
}

/// Per-core recommended offsets of a result set as an apply vector.
fn recommended_vector(results: &[CoreResult]) -> CoreOffsets {
    let mut values = [0; NUM_CORES];
    for result in results {
        values[result.core_index] = result.recommended;
    }
    CoreOffsets::new(values)
}
