//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces collaborators must
//! implement:
//! - OffsetApplier: hardware voltage writes
//! - StabilityProber: stress-workload execution
//! - CrashStateStore: durable crash-recovery record storage
//! - TuneEventSink: fire-and-forget progress notifications
//!
//! These traits keep the search engine independent of the platform
//! integration that hosts it.

pub mod applier;
pub mod errors;
pub mod events;
pub mod null_events;
pub mod prober;
pub mod state_store;

pub use applier::OffsetApplier;
pub use errors::{ApplyError, ProbeError, StateStoreError};
pub use events::{ProgressUpdate, RecoveryNotice, TuneEventSink};
pub use null_events::NullEventSink;
pub use prober::{ProbeReport, ProbeRequest, StabilityProber};
pub use state_store::CrashStateStore;
