//! Crash-state persistence port.

use crate::domain::models::CrashState;
use crate::domain::ports::errors::StateStoreError;
use async_trait::async_trait;

/// Durable storage for the crash-recovery record.
///
/// The active session is the only writer. `persist` must be durable
/// before it returns — the record is the rollback evidence if the very
/// next apply kills the machine.
#[async_trait]
pub trait CrashStateStore: Send + Sync {
    /// Write the record, replacing any previous one.
    async fn persist(&self, state: &CrashState) -> Result<(), StateStoreError>;

    /// Read the record. `None` when no record exists; a corrupted record
    /// is cleared and reported as `None`.
    async fn load(&self) -> Result<Option<CrashState>, StateStoreError>;

    /// Delete the record. Deleting a missing record is not an error.
    async fn clear(&self) -> Result<(), StateStoreError>;
}
