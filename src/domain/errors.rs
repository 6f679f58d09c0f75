//! Domain errors for the voltseek tuning engine.

use thiserror::Error;

/// Errors visible outside a tuning session.
///
/// Per-test failures (apply rejection, probe timeout, hardware fault,
/// state-store write trouble) are handled inside a core's testing loop
/// and never unwind this far; they shape the search result instead.
#[derive(Debug, Error)]
pub enum TuneError {
    /// A second session was requested while one is active. Sessions are
    /// rejected, not queued.
    #[error("A tuning session is already running")]
    SessionAlreadyRunning,
}

/// Convenience alias for engine-level results.
pub type TuneResult<T> = Result<T, TuneError>;
