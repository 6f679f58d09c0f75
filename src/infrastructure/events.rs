//! Channel-backed event sink.
//!
//! Bridges engine notifications onto a bounded tokio channel for an RPC
//! or UI layer to drain. Sends never block the search: when the channel
//! is full or closed the event is dropped and counted, nothing more.

use crate::domain::models::{CoreResult, SessionResult};
use crate::domain::ports::events::{ProgressUpdate, RecoveryNotice, TuneEventSink};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Engine notification as a wire-shaped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TuneEvent {
    /// A stability test is about to run.
    Progress(ProgressUpdate),
    /// A core's search finished.
    CoreComplete(CoreResult),
    /// The session finished.
    SessionComplete(SessionResult),
    /// A crash-recovery record was acted on at startup.
    Recovery(RecoveryNotice),
}

/// Event sink forwarding to an `mpsc` channel.
pub struct ChannelEventSink {
    tx: mpsc::Sender<TuneEvent>,
    dropped: AtomicU64,
}

impl ChannelEventSink {
    /// Create a sink and its receiving half.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TuneEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Number of events dropped because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, event: TuneEvent) {
        if self.tx.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("event channel full or closed; dropping event");
        }
    }
}

#[async_trait]
impl TuneEventSink for ChannelEventSink {
    async fn progress(&self, update: ProgressUpdate) {
        self.send(TuneEvent::Progress(update));
    }

    async fn core_complete(&self, result: &CoreResult) {
        self.send(TuneEvent::CoreComplete(result.clone()));
    }

    async fn session_complete(&self, result: &SessionResult) {
        self.send(TuneEvent::SessionComplete(result.clone()));
    }

    async fn recovery(&self, notice: &RecoveryNotice) {
        self.send(TuneEvent::Recovery(notice.clone()));
    }
}
