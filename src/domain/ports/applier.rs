//! Hardware voltage-apply port.

use crate::domain::models::CoreOffsets;
use crate::domain::ports::errors::ApplyError;
use async_trait::async_trait;

/// Writes a per-core offset vector to hardware.
///
/// The engine holds the single writer to voltage state for the lifetime
/// of a session; implementations do not need their own locking.
#[async_trait]
pub trait OffsetApplier: Send + Sync {
    /// Apply the full vector. Values are already clamped by the caller.
    async fn apply(&self, offsets: CoreOffsets) -> Result<(), ApplyError>;
}
