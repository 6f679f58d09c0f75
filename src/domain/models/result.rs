//! Per-core and whole-session search results.

use crate::domain::models::offsets::NUM_CORES;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Silicon quality classification of a stable offset.
///
/// Thresholds: gold at or below −35 mV, silver down to −20 mV, bronze
/// above that. Total over all inputs — a positive offset is invalid but
/// still classifies as bronze rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Excellent silicon: stable at −35 mV or deeper.
    Gold,
    /// Average silicon: stable between −20 and −35 mV.
    Silver,
    /// Below-average silicon: stable only above −20 mV.
    Bronze,
}

impl QualityTier {
    /// Classify a stable offset.
    pub const fn from_offset(offset_mv: i32) -> Self {
        if offset_mv <= -35 {
            Self::Gold
        } else if offset_mv <= -20 {
            Self::Silver
        } else {
            Self::Bronze
        }
    }

    /// Stable string form, matching the serialized representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
        }
    }
}

/// Recommended daily-driver offset: the proven-stable boundary pulled
/// back toward 0 by the safety margin, capped so it never goes positive.
///
/// Guarantees `result <= 0` and `result >= max_stable`.
pub const fn recommended_offset(max_stable: i32, safety_margin: i32) -> i32 {
    let recommended = max_stable + safety_margin;
    if recommended > 0 {
        0
    } else {
        recommended
    }
}

/// Outcome of searching a single core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreResult {
    /// Core index (0-3).
    pub core_index: usize,
    /// Most aggressive offset that passed, in mV (≤ 0).
    pub max_stable: i32,
    /// `max_stable` plus the safety margin, capped at 0.
    pub recommended: i32,
    /// Quality classification of `max_stable`.
    pub quality_tier: QualityTier,
    /// Number of stability tests run for this core.
    pub iterations: u32,
    /// First offset that failed, if any failure was observed.
    pub failed_value: Option<i32>,
}

impl CoreResult {
    /// Build a result from a discovered boundary, deriving the
    /// recommendation and tier.
    pub fn from_boundary(
        core_index: usize,
        max_stable: i32,
        iterations: u32,
        failed_value: Option<i32>,
        safety_margin: i32,
    ) -> Self {
        Self {
            core_index,
            max_stable,
            recommended: recommended_offset(max_stable, safety_margin),
            quality_tier: QualityTier::from_offset(max_stable),
            iterations,
            failed_value,
        }
    }

    /// A placeholder result for a core the session never reached.
    pub fn untested(core_index: usize, baseline: i32, safety_margin: i32) -> Self {
        Self::from_boundary(core_index, baseline, 0, None, safety_margin)
    }
}

/// Aggregate outcome of a full tuning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Unique session id.
    pub id: Uuid,
    /// One result per core; always exactly [`NUM_CORES`] entries.
    pub cores: Vec<CoreResult>,
    /// Wall-clock session duration in seconds.
    pub duration_secs: f64,
    /// True when this run continued from a crash-recovery record.
    pub recovered: bool,
    /// True when the session was cancelled or stopped early by a limit.
    pub aborted: bool,
    /// When the session finished.
    pub finished_at: DateTime<Utc>,
}

impl SessionResult {
    /// Per-core recommended offsets as a plain array.
    ///
    /// # Panics
    /// Panics if the result does not hold exactly [`NUM_CORES`] entries,
    /// which the orchestrator guarantees.
    pub fn recommended_array(&self) -> [i32; NUM_CORES] {
        assert_eq!(self.cores.len(), NUM_CORES);
        let mut values = [0; NUM_CORES];
        for core in &self.cores {
            values[core.core_index] = core.recommended;
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(QualityTier::from_offset(-50), QualityTier::Gold);
        assert_eq!(QualityTier::from_offset(-35), QualityTier::Gold);
        assert_eq!(QualityTier::from_offset(-34), QualityTier::Silver);
        assert_eq!(QualityTier::from_offset(-20), QualityTier::Silver);
        assert_eq!(QualityTier::from_offset(-19), QualityTier::Bronze);
        assert_eq!(QualityTier::from_offset(0), QualityTier::Bronze);
        // Invalid positive input still classifies.
        assert_eq!(QualityTier::from_offset(12), QualityTier::Bronze);
    }

    #[test]
    fn test_recommended_offset_caps_at_zero() {
        assert_eq!(recommended_offset(-30, 5), -25);
        assert_eq!(recommended_offset(-5, 5), 0);
        assert_eq!(recommended_offset(-3, 20), 0);
        assert_eq!(recommended_offset(0, 5), 0);
        assert_eq!(recommended_offset(-30, 0), -30);
    }

    #[test]
    fn test_recommended_never_more_aggressive_than_stable() {
        for max_stable in -60..=0 {
            for margin in 0..=20 {
                let r = recommended_offset(max_stable, margin);
                assert!(r <= 0);
                assert!(r >= max_stable);
            }
        }
    }

    #[test]
    fn test_core_result_derivation() {
        let result = CoreResult::from_boundary(2, -40, 9, Some(-45), 5);
        assert_eq!(result.recommended, -35);
        assert_eq!(result.quality_tier, QualityTier::Gold);
        assert_eq!(result.failed_value, Some(-45));
    }

    #[test]
    fn test_untested_core_has_zero_iterations() {
        let result = CoreResult::untested(3, 0, 5);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.max_stable, 0);
        assert_eq!(result.recommended, 0);
        assert_eq!(result.failed_value, None);
    }
}
