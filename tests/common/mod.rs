//! Common test utilities for integration tests
//!
//! Provides shared fakes for the hardware ports so sessions can run
//! end-to-end without real voltage writes or stress workloads.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voltseek::domain::ports::errors::{ApplyError, ProbeError, StateStoreError};
use voltseek::domain::ports::prober::{ProbeReport, ProbeRequest};
use voltseek::{
    CoreOffsets, CrashState, CrashStateStore, OffsetApplier, StabilityProber, NUM_CORES,
};

/// Applier that records every vector written to "hardware".
#[derive(Default)]
pub struct RecordingApplier {
    applied: Mutex<Vec<[i32; NUM_CORES]>>,
}

impl RecordingApplier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every vector applied, in order.
    pub fn all(&self) -> Vec<[i32; NUM_CORES]> {
        self.applied.lock().unwrap().clone()
    }

    /// The vector currently on "hardware".
    pub fn current(&self) -> [i32; NUM_CORES] {
        *self.applied.lock().unwrap().last().expect("nothing applied")
    }
}

#[async_trait]
impl OffsetApplier for RecordingApplier {
    async fn apply(&self, offsets: CoreOffsets) -> Result<(), ApplyError> {
        self.applied.lock().unwrap().push(offsets.as_array());
        Ok(())
    }
}

/// Prober simulating silicon with a per-core instability threshold: a
/// probe fails when any core sits at or below its threshold. Optionally
/// fails a number of whole-system verification runs first, and sleeps to
/// give cancellation something to interrupt.
pub struct ScriptedProber {
    fail_below: [i32; NUM_CORES],
    verify_failures_left: AtomicU32,
    delay: Duration,
    cancelled: AtomicBool,
    probes: Mutex<Vec<(Option<usize>, [i32; NUM_CORES])>>,
}

impl ScriptedProber {
    /// Silicon that fails whenever any core goes to `fail_below[i]` or
    /// deeper.
    pub fn new(fail_below: [i32; NUM_CORES]) -> Arc<Self> {
        Arc::new(Self {
            fail_below,
            verify_failures_left: AtomicU32::new(0),
            delay: Duration::ZERO,
            cancelled: AtomicBool::new(false),
            probes: Mutex::new(Vec::new()),
        })
    }

    /// Silicon that never fails a per-core test.
    pub fn always_stable() -> Arc<Self> {
        Self::new([i32::MIN; NUM_CORES])
    }

    /// Build a prober whose every probe takes roughly `delay`.
    pub fn slow(fail_below: [i32; NUM_CORES], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fail_below,
            verify_failures_left: AtomicU32::new(0),
            delay,
            cancelled: AtomicBool::new(false),
            probes: Mutex::new(Vec::new()),
        })
    }

    /// Fail the first `count` whole-system verification runs.
    pub fn with_verify_failures(self: Arc<Self>, count: u32) -> Arc<Self> {
        self.verify_failures_left.store(count, Ordering::SeqCst);
        self
    }

    /// Every probe request seen: (core under test, applied vector).
    pub fn requests(&self) -> Vec<(Option<usize>, [i32; NUM_CORES])> {
        self.probes.lock().unwrap().clone()
    }

    /// Values tested on one core, in order.
    pub fn values_tested(&self, core: usize) -> Vec<i32> {
        self.requests()
            .iter()
            .filter(|(c, _)| *c == Some(core))
            .map(|(_, offsets)| offsets[core])
            .collect()
    }

    fn thresholds_hold(&self, offsets: [i32; NUM_CORES]) -> bool {
        offsets
            .iter()
            .zip(self.fail_below)
            .all(|(v, limit)| *v > limit)
    }
}

#[async_trait]
impl StabilityProber for ScriptedProber {
    async fn probe(&self, request: ProbeRequest) -> Result<ProbeReport, ProbeError> {
        self.probes
            .lock()
            .unwrap()
            .push((request.core_under_test, request.offsets.as_array()));

        let mut remaining = self.delay;
        while !remaining.is_zero() {
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(ProbeError::Cancelled);
            }
            let step = remaining.min(Duration::from_millis(5));
            tokio::time::sleep(step).await;
            remaining -= step;
        }

        if request.core_under_test.is_none() {
            let left = self.verify_failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.verify_failures_left.store(left - 1, Ordering::SeqCst);
                return Ok(ProbeReport {
                    passed: false,
                    hardware_fault: false,
                    log: "verification workload crashed".into(),
                });
            }
        }

        Ok(ProbeReport {
            passed: self.thresholds_hold(request.offsets.as_array()),
            hardware_fault: false,
            log: String::new(),
        })
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// In-memory crash-state store for tests that do not need a real file.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<CrashState>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> Option<CrashState> {
        self.state.lock().unwrap().clone()
    }

    pub fn seed(&self, state: CrashState) {
        *self.state.lock().unwrap() = Some(state);
    }
}

#[async_trait]
impl CrashStateStore for MemoryStore {
    async fn persist(&self, state: &CrashState) -> Result<(), StateStoreError> {
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<CrashState>, StateStoreError> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn clear(&self) -> Result<(), StateStoreError> {
        *self.state.lock().unwrap() = None;
        Ok(())
    }
}
