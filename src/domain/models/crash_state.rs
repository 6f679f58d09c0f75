//! Disk-resident crash-recovery record.
//!
//! Written immediately before every risky apply, deleted immediately
//! after the apply-and-test is confirmed safe, and read exactly once at
//! session start. A record with `active == true` found at startup means
//! the previous run died mid-test.

use crate::domain::models::offsets::NUM_CORES;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of the search configuration carried inside the recovery
/// record, so a resumed run steps identically to the crashed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    /// Step decrement in mV.
    pub step_size: i32,
    /// Stress-test length in seconds.
    pub test_duration: u64,
    /// Safety margin in mV.
    pub safety_margin: i32,
}

/// Where a recovered session picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    /// Core to continue on.
    pub core: usize,
    /// First value to test on that core.
    pub value: i32,
}

/// The on-disk crash-recovery record.
///
/// Serialized as JSON with string map keys for `failed_values`, e.g.
/// `{"0": [-25], "2": [-30, -35]}`. Absence of the record is equivalent
/// to `active: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashState {
    /// True while a test is in flight.
    pub active: bool,
    /// Core under test when the record was written (0-3).
    pub current_core: usize,
    /// Offset being tested when the record was written (≤ 0).
    pub current_value: i32,
    /// Best confirmed-stable offset per core so far.
    pub core_results: [i32; NUM_CORES],
    /// Known-bad offsets per core.
    pub failed_values: BTreeMap<usize, Vec<i32>>,
    /// Configuration in effect for the session.
    pub config: PersistedConfig,
    /// When the record was written.
    pub timestamp: DateTime<Utc>,
}

impl CrashState {
    /// Build an active record for a test about to run.
    pub fn for_test(
        current_core: usize,
        current_value: i32,
        core_results: [i32; NUM_CORES],
        failed_values: BTreeMap<usize, Vec<i32>>,
        config: PersistedConfig,
    ) -> Self {
        Self {
            active: true,
            current_core,
            current_value,
            core_results,
            failed_values,
            config,
            timestamp: Utc::now(),
        }
    }

    /// Record the in-flight value as failed. A crashed test is never
    /// assumed to have passed.
    pub fn mark_crashed_value_failed(&mut self) {
        let entry = self.failed_values.entry(self.current_core).or_default();
        if !entry.contains(&self.current_value) {
            entry.push(self.current_value);
        }
    }

    /// Compute where a recovered session resumes.
    ///
    /// The next value is one step below the crashed one; when that would
    /// fall below the platform limit, the crashed core is finished and
    /// the next core starts from 0.
    pub fn resume_point(&self, safe_limit: i32) -> ResumePoint {
        let next_value = self.current_value - self.config.step_size;
        if next_value < safe_limit {
            ResumePoint {
                core: self.current_core + 1,
                value: 0,
            }
        } else {
            ResumePoint {
                core: self.current_core,
                value: next_value,
            }
        }
    }
}
