//! Null event sink implementation.
//!
//! Used when no UI or RPC layer is attached but the engine requires a
//! TuneEventSink implementation.

use async_trait::async_trait;

use super::events::{ProgressUpdate, RecoveryNotice, TuneEventSink};
use crate::domain::models::{CoreResult, SessionResult};

/// A no-op event sink that drops every notification.
#[derive(Debug, Clone, Default)]
pub struct NullEventSink;

impl NullEventSink {
    /// Create the sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TuneEventSink for NullEventSink {
    async fn progress(&self, _update: ProgressUpdate) {}

    async fn core_complete(&self, _result: &CoreResult) {}

    async fn session_complete(&self, _result: &SessionResult) {}

    async fn recovery(&self, _notice: &RecoveryNotice) {}
}
