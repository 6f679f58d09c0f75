//! Progress and completion event port.
//!
//! Events are a fire-and-forget side channel toward a UI or RPC layer.
//! A sink that fails or blocks must never abort or stall the search, so
//! every method is infallible from the engine's point of view.

use crate::domain::models::{CoreOffsets, CoreResult, SessionResult, NUM_CORES};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Progress snapshot emitted before each stability test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Core under test (0-3).
    pub core: usize,
    /// Offset about to be tested, in mV.
    pub value: i32,
    /// 1-based test counter within the current core.
    pub iteration: u32,
    /// Estimated seconds until the session completes.
    pub eta_seconds: u64,
    /// Fraction of the session finished, in `[0.0, 1.0]`.
    pub percent: f64,
    /// Best confirmed-stable offset per core so far.
    pub core_results: [i32; NUM_CORES],
}

/// Details of a crash recovery performed at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryNotice {
    /// Core that was in flight when the previous run died.
    pub crashed_core: usize,
    /// Offset that was in flight; assumed unstable.
    pub crashed_value: i32,
    /// Confirmed-safe vector re-applied before testing resumed.
    pub restored: CoreOffsets,
}

/// Receives engine notifications.
#[async_trait]
pub trait TuneEventSink: Send + Sync {
    /// A stability test is about to run.
    async fn progress(&self, update: ProgressUpdate);

    /// A core's search finished.
    async fn core_complete(&self, result: &CoreResult);

    /// The whole session finished (normally, aborted, or after
    /// verification fallback).
    async fn session_complete(&self, result: &SessionResult);

    /// A crash-recovery record was found and acted on at startup.
    async fn recovery(&self, notice: &RecoveryNotice);
}
