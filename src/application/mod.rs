//! Application layer: session-level orchestration.

pub mod session;

pub use session::SessionOrchestrator;
