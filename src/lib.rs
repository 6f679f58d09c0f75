//! Voltseek - Per-Core Undervolt Boundary Search
//!
//! Voltseek discovers, per physical CPU core, the most aggressive stable
//! undervolt offset by iteratively applying candidate values to hardware
//! and stress-testing them, while guaranteeing that a crash or power
//! loss during the riskiest step can be detected and rolled back at next
//! startup.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, port traits, and errors
//! - **Service Layer** (`services`): Search state machine and supporting logic
//! - **Application Layer** (`application`): Session orchestration
//! - **Infrastructure Layer** (`infrastructure`): Storage, settings, logging
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use voltseek::application::SessionOrchestrator;
//! use voltseek::domain::models::{CoreOffsets, SearchConfig};
//! use voltseek::infrastructure::JsonStateFile;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(JsonStateFile::new("/tmp/voltseek_state.json"));
//!     // Wire a hardware applier, a stress prober, and an event sink,
//!     // then run the session:
//!     // let orchestrator = SessionOrchestrator::new(applier, prober, store, events, -30);
//!     // let report = orchestrator.run(SearchConfig::default(), CoreOffsets::zeroed()).await?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::SessionOrchestrator;
pub use domain::errors::{TuneError, TuneResult};
pub use domain::models::{
    CoreOffsets, CoreResult, CrashState, PulseConfig, QualityTier, SearchConfig, SearchStrategy,
    SessionResult, NUM_CORES,
};
pub use domain::ports::{
    CrashStateStore, NullEventSink, OffsetApplier, ProbeReport, ProbeRequest, ProgressUpdate,
    StabilityProber, TuneEventSink,
};
pub use infrastructure::{ChannelEventSink, JsonStateFile, Settings, SettingsLoader, TuneEvent};
pub use services::{CancelFlag, SearchController};
