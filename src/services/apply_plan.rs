//! Per-core apply-vector construction.
//!
//! While core N is under test, the rest of the vector must be held
//! still: cores already searched keep their proven-stable values, cores
//! not yet searched keep their pre-session baseline. A failure on core N
//! is then attributable to core N alone.

use crate::domain::models::{CoreOffsets, NUM_CORES};

/// Build the vector to apply for "test `core_under_test` at
/// `test_value`".
///
/// For index `i`:
/// - `i < core_under_test`: the discovered stable value (`stable[i]`)
/// - `i == core_under_test`: `test_value`
/// - `i > core_under_test`: the pre-session baseline (`initial[i]`)
pub fn build_apply_offsets(
    core_under_test: usize,
    test_value: i32,
    stable: &CoreOffsets,
    initial: &CoreOffsets,
) -> CoreOffsets {
    let mut values = [0; NUM_CORES];
    for (i, slot) in values.iter_mut().enumerate() {
        *slot = if i < core_under_test {
            stable.get(i)
        } else if i == core_under_test {
            test_value
        } else {
            initial.get(i)
        };
    }
    CoreOffsets::new(values)
}
