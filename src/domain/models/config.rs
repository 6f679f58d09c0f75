//! Session configuration with construction-time clamping.
//!
//! Every numeric knob is clamped into its valid range when the config is
//! built. Out-of-range input is logged at warn level and corrected, never
//! rejected, so a session can always start with whatever the caller had.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// How a core's stability boundary is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Linear stepping only: stop at the first failing value.
    LinearOnly,
    /// Linear stepping, then binary-search refinement of the
    /// `[last_good, first_fail]` bracket.
    LinearThenBinary,
}

impl SearchStrategy {
    /// Stable string form, matching the serialized representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LinearOnly => "linear_only",
            Self::LinearThenBinary => "linear_then_binary",
        }
    }
}

/// Transient-load pulse parameters forwarded to the stability prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Load pulse length in milliseconds.
    pub pulse_ms: u32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self { pulse_ms: 100 }
    }
}

/// Immutable per-session search configuration.
///
/// Construct with [`SearchConfig::builder`]; all fields are clamped at
/// that point and never re-validated at use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    step_size: i32,
    test_duration_secs: u64,
    safety_margin: i32,
    pulse: PulseConfig,
    strategy: SearchStrategy,
    refine_tolerance: i32,
    refine_iteration_cap: u32,
    verify: bool,
    verify_duration_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SearchConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Step decrement between tested values, in mV. Within `[1, 20]`.
    pub const fn step_size(&self) -> i32 {
        self.step_size
    }

    /// Stress-test length per tested value. Within `[10s, 300s]`.
    pub const fn test_duration(&self) -> Duration {
        Duration::from_secs(self.test_duration_secs)
    }

    /// Stress-test length per tested value, in whole seconds.
    pub const fn test_duration_secs(&self) -> u64 {
        self.test_duration_secs
    }

    /// Margin added back toward 0 before recommending a value, in mV.
    /// Within `[0, 20]`.
    pub const fn safety_margin(&self) -> i32 {
        self.safety_margin
    }

    /// Pulse parameters forwarded to the prober.
    pub const fn pulse(&self) -> PulseConfig {
        self.pulse
    }

    /// Search strategy for each core.
    pub const fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    /// Bracket width at which binary refinement stops, in mV.
    pub const fn refine_tolerance(&self) -> i32 {
        self.refine_tolerance
    }

    /// Hard cap on binary refinement iterations per core.
    pub const fn refine_iteration_cap(&self) -> u32 {
        self.refine_iteration_cap
    }

    /// Whether a whole-system verification pass runs after the search.
    pub const fn verify(&self) -> bool {
        self.verify
    }

    /// Duration of the verification stress test.
    pub const fn verify_duration(&self) -> Duration {
        Duration::from_secs(self.verify_duration_secs)
    }
}

/// Builder for [`SearchConfig`]; clamps every field in `build`.
#[derive(Debug, Clone)]
pub struct SearchConfigBuilder {
    step_size: i32,
    test_duration_secs: u64,
    safety_margin: i32,
    pulse: PulseConfig,
    strategy: SearchStrategy,
    refine_tolerance: Option<i32>,
    refine_iteration_cap: u32,
    verify: bool,
    verify_duration_secs: u64,
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self {
            step_size: 5,
            test_duration_secs: 60,
            safety_margin: 5,
            pulse: PulseConfig::default(),
            strategy: SearchStrategy::LinearOnly,
            refine_tolerance: None,
            refine_iteration_cap: 5,
            verify: false,
            verify_duration_secs: 60,
        }
    }
}

impl SearchConfigBuilder {
    /// Step decrement in mV.
    pub const fn step_size(mut self, mv: i32) -> Self {
        self.step_size = mv;
        self
    }

    /// Stress-test length per tested value, in seconds.
    pub const fn test_duration_secs(mut self, secs: u64) -> Self {
        self.test_duration_secs = secs;
        self
    }

    /// Safety margin in mV.
    pub const fn safety_margin(mut self, mv: i32) -> Self {
        self.safety_margin = mv;
        self
    }

    /// Prober pulse parameters.
    pub const fn pulse(mut self, pulse: PulseConfig) -> Self {
        self.pulse = pulse;
        self
    }

    /// Search strategy.
    pub const fn strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bracket width at which refinement stops; defaults to twice the
    /// step size.
    pub const fn refine_tolerance(mut self, mv: i32) -> Self {
        self.refine_tolerance = Some(mv);
        self
    }

    /// Cap on refinement iterations per core.
    pub const fn refine_iteration_cap(mut self, cap: u32) -> Self {
        self.refine_iteration_cap = cap;
        self
    }

    /// Enable the whole-system verification pass.
    pub const fn verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Duration of the verification stress test, in seconds.
    pub const fn verify_duration_secs(mut self, secs: u64) -> Self {
        self.verify_duration_secs = secs;
        self
    }

    /// Clamp all fields and produce the immutable configuration.
    pub fn build(self) -> SearchConfig {
        let step_size = clamp_i32("step_size", self.step_size, 1, 20);
        let tolerance = self.refine_tolerance.unwrap_or(step_size * 2);
        SearchConfig {
            step_size,
            test_duration_secs: clamp_u64("test_duration", self.test_duration_secs, 10, 300),
            safety_margin: clamp_i32("safety_margin", self.safety_margin, 0, 20),
            pulse: PulseConfig {
                pulse_ms: clamp_u32("pulse_ms", self.pulse.pulse_ms, 10, 500),
            },
            strategy: self.strategy,
            refine_tolerance: clamp_i32("refine_tolerance", tolerance, 1, 40),
            refine_iteration_cap: clamp_u32(
                "refine_iteration_cap",
                self.refine_iteration_cap,
                1,
                10,
            ),
            verify: self.verify,
            verify_duration_secs: clamp_u64("verify_duration", self.verify_duration_secs, 30, 600),
        }
    }
}

fn clamp_i32(name: &str, value: i32, min: i32, max: i32) -> i32 {
    if value < min || value > max {
        warn!(field = name, value, min, max, "clamping out-of-range config value");
    }
    value.clamp(min, max)
}

fn clamp_u64(name: &str, value: u64, min: u64, max: u64) -> u64 {
    if value < min || value > max {
        warn!(field = name, value, min, max, "clamping out-of-range config value");
    }
    value.clamp(min, max)
}

fn clamp_u32(name: &str, value: u32, min: u32, max: u32) -> u32 {
    if value < min || value > max {
        warn!(field = name, value, min, max, "clamping out-of-range config value");
    }
    value.clamp(min, max)
}
