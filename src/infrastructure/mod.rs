//! Infrastructure layer: file storage, settings, logging, and event
//! plumbing.

pub mod config;
pub mod events;
pub mod logging;
pub mod state_file;

pub use config::{ConfigError, LoggingSettings, Settings, SettingsLoader, TuningSettings};
pub use events::{ChannelEventSink, TuneEvent};
pub use logging::Logger;
pub use state_file::JsonStateFile;
