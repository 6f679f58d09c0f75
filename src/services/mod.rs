//! Service layer: the search state machine and its supporting logic.

pub mod apply_plan;
pub mod cancel;
pub mod progress;
pub mod recovery;
pub mod search;
pub mod sequence;

pub use apply_plan::build_apply_offsets;
pub use cancel::CancelFlag;
pub use progress::EtaEstimator;
pub use recovery::RecoveryPlan;
pub use search::{CoreSearchOutcome, SearchController};
pub use sequence::{step_sequence, step_sequence_from};
