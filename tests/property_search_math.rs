//! Property tests for the pure search math: clamping, classification,
//! sequence generation, apply-vector isolation, and crash-resume rules.

use proptest::prelude::*;
use std::collections::BTreeMap;
use voltseek::domain::models::crash_state::PersistedConfig;
use voltseek::domain::models::recommended_offset;
use voltseek::services::{build_apply_offsets, step_sequence};
use voltseek::{CoreOffsets, CrashState, QualityTier, NUM_CORES};

proptest! {
    /// Property: clamped offsets always land in [limit, 0] and match
    /// `max(limit, min(0, v))` element-wise.
    #[test]
    fn prop_clamp_envelope(
        values in prop::array::uniform4(-200i32..200),
        limit in -100i32..-1,
    ) {
        let clamped = CoreOffsets::new(values).clamped(limit);
        for (raw, got) in values.iter().zip(clamped.as_array()) {
            prop_assert_eq!(got, (*raw).min(0).max(limit));
            prop_assert!((limit..=0).contains(&got));
        }
    }

    /// Property: the stepping sequence starts at 0, each term is -i*S,
    /// and every term stays at or above the limit.
    #[test]
    fn prop_step_sequence_shape(
        step in 1i32..=20,
        limit in -100i32..-1,
    ) {
        let sequence = step_sequence(step, limit);
        prop_assert!(!sequence.is_empty());
        prop_assert_eq!(sequence[0], 0);
        for (i, term) in sequence.iter().enumerate() {
            prop_assert_eq!(*term, -(i as i32) * step);
            prop_assert!(*term >= limit);
        }
        // The next term after the last would fall below the limit.
        let next = sequence.last().unwrap() - step;
        prop_assert!(next < limit);
    }

    /// Property: recommended(M, S) == min(M + S, 0), never positive and
    /// never more aggressive than the proven-stable point.
    #[test]
    fn prop_recommended_bounds(
        max_stable in -100i32..=0,
        margin in 0i32..=20,
    ) {
        let recommended = recommended_offset(max_stable, margin);
        prop_assert_eq!(recommended, (max_stable + margin).min(0));
        prop_assert!(recommended <= 0);
        prop_assert!(recommended >= max_stable);
    }

    /// Property: quality tiers split at -35 and -20.
    #[test]
    fn prop_quality_tier_thresholds(value in -100i32..=0) {
        let tier = QualityTier::from_offset(value);
        if value <= -35 {
            prop_assert_eq!(tier, QualityTier::Gold);
        } else if value <= -20 {
            prop_assert_eq!(tier, QualityTier::Silver);
        } else {
            prop_assert_eq!(tier, QualityTier::Bronze);
        }
    }

    /// Property: the apply vector partitions cores into proven / under
    /// test / untouched.
    #[test]
    fn prop_apply_vector_isolation(
        core in 0usize..NUM_CORES,
        test_value in -100i32..=0,
        stable in prop::array::uniform4(-50i32..=0),
        initial in prop::array::uniform4(-50i32..=0),
    ) {
        let stable = CoreOffsets::new(stable);
        let initial = CoreOffsets::new(initial);
        let applied = build_apply_offsets(core, test_value, &stable, &initial);
        for i in 0..NUM_CORES {
            if i < core {
                prop_assert_eq!(applied.get(i), stable.get(i));
            } else if i == core {
                prop_assert_eq!(applied.get(i), test_value);
            } else {
                prop_assert_eq!(applied.get(i), initial.get(i));
            }
        }
    }

    /// Property: after a crash at (core, value), recovery marks the
    /// value failed and resumes at (core, value - step), rolling to the
    /// next core when that would pass the limit.
    #[test]
    fn prop_crash_resume_rule(
        core in 0usize..NUM_CORES,
        step in 1i32..=20,
        limit in -100i32..-1,
        step_count in 0u32..=10,
    ) {
        // Pick a crashed value on the stepping grid, at or above the limit.
        let value = (-(step_count as i32) * step).max(limit);
        let mut state = CrashState::for_test(
            core,
            value,
            [0; NUM_CORES],
            BTreeMap::new(),
            PersistedConfig { step_size: step, test_duration: 60, safety_margin: 5 },
        );
        state.mark_crashed_value_failed();
        prop_assert!(state.failed_values[&core].contains(&value));

        let resume = state.resume_point(limit);
        if value - step < limit {
            prop_assert_eq!(resume.core, core + 1);
            prop_assert_eq!(resume.value, 0);
        } else {
            prop_assert_eq!(resume.core, core);
            prop_assert_eq!(resume.value, value - step);
        }
    }

    /// Property: the crash record survives a JSON round-trip exactly.
    #[test]
    fn prop_crash_state_round_trip(
        core in 0usize..NUM_CORES,
        value in -100i32..=0,
        results in prop::array::uniform4(-50i32..=0),
        failed in prop::collection::vec(-50i32..=0, 0..6),
    ) {
        let mut failed_values = BTreeMap::new();
        if !failed.is_empty() {
            failed_values.insert(core, failed);
        }
        let state = CrashState::for_test(
            core,
            value,
            results,
            failed_values,
            PersistedConfig { step_size: 5, test_duration: 60, safety_margin: 5 },
        );
        let json = serde_json::to_string(&state).unwrap();
        let back: CrashState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, state);
    }
}
