//! Crash-recovery planning.
//!
//! Consulted exactly once, at session start. An active crash record
//! means the previous run died while a test was in flight; the value in
//! flight is assumed unstable, the confirmed-safe vector is re-applied,
//! and the search resumes one step past the crash point.

use crate::domain::models::{CoreOffsets, CrashState, ResumePoint, NUM_CORES};
use crate::domain::ports::events::RecoveryNotice;
use std::collections::BTreeMap;
use tracing::warn;

/// Everything the orchestrator needs to continue a crashed session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryPlan {
    /// Core and value to continue from.
    pub resume: ResumePoint,
    /// Confirmed-stable vector at crash time; re-applied before testing.
    pub stable: CoreOffsets,
    /// Known-bad values per core, including the crashed value.
    pub failed_values: BTreeMap<usize, Vec<i32>>,
    /// Core in flight when the crash happened.
    pub crashed_core: usize,
    /// Value in flight when the crash happened.
    pub crashed_value: i32,
}

impl RecoveryPlan {
    /// Derive a plan from a crash record found at startup.
    pub fn from_state(mut state: CrashState, safe_limit: i32) -> Self {
        warn!(
            core = state.current_core,
            value = state.current_value,
            "unclean exit detected; value in flight is treated as unstable"
        );
        state.mark_crashed_value_failed();
        let resume = state.resume_point(safe_limit);
        Self {
            resume,
            stable: CoreOffsets::new(state.core_results),
            failed_values: state.failed_values,
            crashed_core: state.current_core,
            crashed_value: state.current_value,
        }
    }

    /// Whether any core is left to test after the crash point.
    pub fn exhausted(&self) -> bool {
        self.resume.core >= NUM_CORES
    }

    /// Event payload describing the recovery.
    pub fn notice(&self) -> RecoveryNotice {
        RecoveryNotice {
            crashed_core: self.crashed_core,
            crashed_value: self.crashed_value,
            restored: self.stable,
        }
    }
}
