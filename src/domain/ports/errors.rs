//! Errors surfaced by the hardware and storage ports.

use thiserror::Error;

/// Hardware apply errors.
///
/// An apply failure during a search is treated as a test failure for the
/// value under test, never as a session-fatal error.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Hardware write rejected: {0}")]
    Rejected(String),

    #[error("Apply tool not available: {0}")]
    Unavailable(String),

    #[error("Apply timed out after {0}s")]
    Timeout(u64),
}

/// Stability prober errors.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Stress workload failed to launch: {0}")]
    LaunchFailed(String),

    #[error("Probe exceeded {0}s and was terminated")]
    Timeout(u64),

    #[error("Probe was cancelled")]
    Cancelled,
}

/// Crash-state persistence errors.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
