//! Stability-probe port.
//!
//! A prober applies load for a bounded window and reports whether the
//! machine stayed healthy. Hardware faults (machine-check exceptions,
//! kernel-logged hardware errors scraped during the window) are reported
//! separately from the workload's own verdict and override it.

use crate::domain::models::{CoreOffsets, PulseConfig};
use crate::domain::ports::errors::ProbeError;
use async_trait::async_trait;
use std::time::Duration;

/// One stability-test request.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// Vector currently applied to hardware for this test.
    pub offsets: CoreOffsets,
    /// Core the test is meant to exercise (0-3), or `None` for a
    /// whole-system verification run.
    pub core_under_test: Option<usize>,
    /// Requested stress duration.
    pub duration: Duration,
    /// Transient-load pulse parameters.
    pub pulse: PulseConfig,
}

/// Outcome of one stability test.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Workload verdict: true when the stress run completed cleanly.
    pub passed: bool,
    /// True when a machine-check or kernel hardware error was observed
    /// during the window, regardless of `passed`.
    pub hardware_fault: bool,
    /// Captured workload / kernel log excerpt for diagnostics.
    pub log: String,
}

impl ProbeReport {
    /// Whether the tested value counts as stable: the workload passed
    /// and no hardware fault was seen.
    pub fn is_stable(&self) -> bool {
        self.passed && !self.hardware_fault
    }
}

/// Runs a stress workload against the currently-applied vector.
#[async_trait]
pub trait StabilityProber: Send + Sync {
    /// Run one probe. Implementations should return within the requested
    /// duration plus their own teardown time; the engine additionally
    /// enforces a hard `duration + 10s` deadline and treats overrun as
    /// failure.
    async fn probe(&self, request: ProbeRequest) -> Result<ProbeReport, ProbeError>;

    /// Ask an in-flight probe to stop early. Cooperative; used on
    /// cancellation and on deadline overrun.
    fn cancel(&self);
}
