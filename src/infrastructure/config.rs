//! Settings loading with hierarchical merging.
//!
//! Numeric tuning knobs are clamped by `SearchConfig` at construction
//! and never rejected here; only non-numeric settings (log level and
//! format) are validated.

use crate::domain::models::{SearchConfig, SearchStrategy, PulseConfig};
use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Search-related settings as read from disk or environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningSettings {
    /// Step decrement in mV.
    #[serde(default = "default_step_size")]
    pub step_size: i32,
    /// Stress-test length per value, in seconds.
    #[serde(default = "default_test_duration")]
    pub test_duration: u64,
    /// Safety margin in mV.
    #[serde(default = "default_safety_margin")]
    pub safety_margin: i32,
    /// Load pulse length in milliseconds.
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u32,
    /// Search strategy.
    #[serde(default = "default_strategy")]
    pub strategy: SearchStrategy,
    /// Whether to run the whole-system verification pass.
    #[serde(default)]
    pub verify: bool,
    /// Verification test length in seconds.
    #[serde(default = "default_verify_duration")]
    pub verify_duration: u64,
}

const fn default_step_size() -> i32 {
    5
}

const fn default_test_duration() -> u64 {
    60
}

const fn default_safety_margin() -> i32 {
    5
}

const fn default_pulse_ms() -> u32 {
    100
}

const fn default_strategy() -> SearchStrategy {
    SearchStrategy::LinearOnly
}

const fn default_verify_duration() -> u64 {
    60
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            test_duration: default_test_duration(),
            safety_margin: default_safety_margin(),
            pulse_ms: default_pulse_ms(),
            strategy: default_strategy(),
            verify: false,
            verify_duration: default_verify_duration(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Optional directory for rolling log files.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Root settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Platform's most aggressive permitted offset, in mV (negative).
    #[serde(default = "default_safe_limit")]
    pub safe_limit: i32,
    /// Path of the crash-recovery record.
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Search knobs.
    #[serde(default)]
    pub tuning: TuningSettings,
    /// Logging knobs.
    #[serde(default)]
    pub logging: LoggingSettings,
}

const fn default_safe_limit() -> i32 {
    -30
}

fn default_state_file() -> String {
    "/tmp/voltseek_state.json".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            safe_limit: default_safe_limit(),
            state_file: default_state_file(),
            tuning: TuningSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Build the clamped, immutable search configuration.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::builder()
            .step_size(self.tuning.step_size)
            .test_duration_secs(self.tuning.test_duration)
            .safety_margin(self.tuning.safety_margin)
            .pulse(PulseConfig {
                pulse_ms: self.tuning.pulse_ms,
            })
            .strategy(self.tuning.strategy)
            .verify(self.tuning.verify)
            .verify_duration_secs(self.tuning.verify_duration)
            .build()
    }
}

/// Settings loader with hierarchical merging.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .voltseek/config.yaml (project config)
    /// 3. .voltseek/local.yaml (local overrides, optional)
    /// 4. Environment variables (VOLTSEEK_* prefix, highest priority)
    pub fn load() -> Result<Settings> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(".voltseek/config.yaml"))
            .merge(Yaml::file(".voltseek/local.yaml"))
            .merge(Env::prefixed("VOLTSEEK_").split("__"))
            .extract()
            .context("Failed to extract settings from figment")?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Settings> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load settings from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Validate non-numeric settings after loading.
    pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&settings.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(settings.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&settings.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(
                settings.logging.format.clone(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(SettingsLoader::validate(&settings).is_ok());
        assert_eq!(settings.safe_limit, -30);
    }

    #[test]
    fn test_search_config_clamps_out_of_range_settings() {
        let settings = Settings {
            tuning: TuningSettings {
                step_size: 99,
                test_duration: 1,
                ..TuningSettings::default()
            },
            ..Settings::default()
        };
        let config = settings.search_config();
        assert_eq!(config.step_size(), 20);
        assert_eq!(config.test_duration_secs(), 10);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let settings = Settings {
            logging: LoggingSettings {
                level: "verbose".to_string(),
                ..LoggingSettings::default()
            },
            ..Settings::default()
        };
        assert!(matches!(
            SettingsLoader::validate(&settings),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.safe_limit, settings.safe_limit);
        assert_eq!(back.tuning.step_size, settings.tuning.step_size);
    }
}
