//! Domain models for the voltseek tuning engine.

pub mod config;
pub mod crash_state;
pub mod offsets;
pub mod result;

pub use config::{PulseConfig, SearchConfig, SearchConfigBuilder, SearchStrategy};
pub use crash_state::{CrashState, PersistedConfig, ResumePoint};
pub use offsets::{CoreOffsets, NUM_CORES};
pub use result::{recommended_offset, CoreResult, QualityTier, SessionResult};
