//! Per-core voltage offset vector and safety clamping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of physical CPU cores covered by a tuning session.
pub const NUM_CORES: usize = 4;

/// A full per-core undervolt assignment, in millivolts.
///
/// Always exactly [`NUM_CORES`] entries. Offsets are negative (more
/// negative is more aggressive); `0` means stock voltage. Values are
/// brought into the safety envelope with [`CoreOffsets::clamped`] before
/// they ever reach hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreOffsets([i32; NUM_CORES]);

impl CoreOffsets {
    /// Create a vector from explicit per-core values.
    pub const fn new(values: [i32; NUM_CORES]) -> Self {
        Self(values)
    }

    /// The all-zero (stock voltage) vector.
    pub const fn zeroed() -> Self {
        Self([0; NUM_CORES])
    }

    /// A vector with the same offset on every core.
    pub const fn uniform(value: i32) -> Self {
        Self([value; NUM_CORES])
    }

    /// Offset for a single core.
    ///
    /// # Panics
    /// Panics if `core >= NUM_CORES`.
    pub fn get(&self, core: usize) -> i32 {
        self.0[core]
    }

    /// Replace the offset for a single core, returning the new vector.
    ///
    /// # Panics
    /// Panics if `core >= NUM_CORES`.
    pub fn with(&self, core: usize, value: i32) -> Self {
        let mut values = self.0;
        values[core] = value;
        Self(values)
    }

    /// The raw per-core array.
    pub const fn as_array(&self) -> [i32; NUM_CORES] {
        self.0
    }

    /// Clamp every offset into `[safe_limit, 0]`.
    ///
    /// Total over all inputs: positive values collapse to `0`, values
    /// below the platform limit collapse to the limit. Never errors,
    /// even for a (nonsensical) non-negative limit.
    pub fn clamped(&self, safe_limit: i32) -> Self {
        let floor = safe_limit.min(0);
        let mut values = self.0;
        for v in &mut values {
            *v = (*v).clamp(floor, 0);
        }
        Self(values)
    }

    /// True when every offset already lies within `[safe_limit, 0]`.
    pub fn is_within(&self, safe_limit: i32) -> bool {
        self.0.iter().all(|v| (safe_limit..=0).contains(v))
    }
}

impl From<[i32; NUM_CORES]> for CoreOffsets {
    fn from(values: [i32; NUM_CORES]) -> Self {
        Self(values)
    }
}

impl fmt::Display for CoreOffsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_is_total() {
        let offsets = CoreOffsets::new([5, -10, -100, 0]);
        let clamped = offsets.clamped(-30);
        assert_eq!(clamped.as_array(), [0, -10, -30, 0]);
    }

    #[test]
    fn test_clamped_noop_when_within_envelope() {
        let offsets = CoreOffsets::new([0, -5, -15, -30]);
        assert_eq!(offsets.clamped(-30), offsets);
        assert!(offsets.is_within(-30));
    }

    #[test]
    fn test_clamped_matches_envelope_formula() {
        // clamp(v) == max(limit, min(0, v)) element-wise
        let offsets = CoreOffsets::new([7, -3, -31, -30]);
        let clamped = offsets.clamped(-30);
        for (raw, got) in offsets.as_array().iter().zip(clamped.as_array()) {
            assert_eq!(got, (*raw).min(0).max(-30));
        }
    }

    #[test]
    fn test_with_replaces_single_core() {
        let offsets = CoreOffsets::zeroed().with(2, -15);
        assert_eq!(offsets.as_array(), [0, 0, -15, 0]);
        assert_eq!(offsets.get(2), -15);
    }

    #[test]
    fn test_serde_transparent_round_trip() {
        let offsets = CoreOffsets::new([0, -5, -10, -15]);
        let json = serde_json::to_string(&offsets).unwrap();
        assert_eq!(json, "[0,-5,-10,-15]");
        let back: CoreOffsets = serde_json::from_str(&json).unwrap();
        assert_eq!(back, offsets);
    }
}
