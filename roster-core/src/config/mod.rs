//! Configuration management for roster
//!
//! Configuration comes from a TOML file or from `ROSTER_*` environment
//! variables layered over the defaults, and is validated before use.

use crate::group::GroupFlags;
use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Initial state of a group
    pub group: GroupConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

/// Initial group state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Handle of the local party, 0 for none
    pub self_handle: u32,

    /// Flags the group starts with
    pub flags: GroupFlags,

    /// Log a human-readable dump of every emitted event
    pub log_diffs: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Register metric descriptions at startup
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self { self_handle: 0, flags: GroupFlags::empty(), log_diffs: false }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: ROSTER_<SECTION>_<KEY>
    /// Example: ROSTER_GROUP_FLAGS="CAN_ADD | CAN_REMOVE"
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Logging config
        if let Some(level) = lookup("ROSTER_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(json) = lookup("ROSTER_LOG_JSON") {
            config.logging.json_format = parse_bool("ROSTER_LOG_JSON", &json)?;
        }

        // Group config
        if let Some(handle) = lookup("ROSTER_GROUP_SELF_HANDLE") {
            config.group.self_handle = handle.trim().parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid self handle: {}", e))
            })?;
        }
        if let Some(flags) = lookup("ROSTER_GROUP_FLAGS") {
            config.group.flags = parse_flags(&flags)?;
        }
        if let Some(log_diffs) = lookup("ROSTER_GROUP_LOG_DIFFS") {
            config.group.log_diffs = parse_bool("ROSTER_GROUP_LOG_DIFFS", &log_diffs)?;
        }

        // Metrics config
        if let Some(enabled) = lookup("ROSTER_METRICS_ENABLED") {
            config.metrics.enabled = parse_bool("ROSTER_METRICS_ENABLED", &enabled)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if LogLevel::from_str(&self.logging.level).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        if self.group.flags.bits() & !GroupFlags::all().bits() != 0 {
            return Err(ConfigError::ValidationFailed(format!(
                "Unknown group flag bits: {:#x}",
                self.group.flags.bits() & !GroupFlags::all().bits()
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid {} flag: {}", key, e)))
}

/// Parse flags in bitflags text form, e.g. `CAN_ADD | CAN_REMOVE`
pub fn parse_flags(value: &str) -> Result<GroupFlags, ConfigError> {
    bitflags::parser::from_str::<GroupFlags>(value.trim())
        .map_err(|e| ConfigError::InvalidFlags(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.group.flags.is_empty());
        assert_eq!(config.group.self_handle, 0);
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("ROSTER_LOG_LEVEL", "debug"),
            ("ROSTER_LOG_JSON", "true"),
            ("ROSTER_GROUP_SELF_HANDLE", "3"),
            ("ROSTER_GROUP_FLAGS", "CAN_ADD | CAN_RESCIND"),
            ("ROSTER_GROUP_LOG_DIFFS", "true"),
            ("ROSTER_METRICS_ENABLED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.group.self_handle, 3);
        assert_eq!(config.group.flags, GroupFlags::CAN_ADD | GroupFlags::CAN_RESCIND);
        assert!(config.group.log_diffs);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("ROSTER_GROUP_FLAGS", "CAN_FLY")])),
            Err(ConfigError::InvalidFlags(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("ROSTER_GROUP_SELF_HANDLE", "me")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("ROSTER_LOG_LEVEL", "loud")])),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags("").unwrap(), GroupFlags::empty());
        assert_eq!(parse_flags(" CAN_REMOVE ").unwrap(), GroupFlags::CAN_REMOVE);
        assert_eq!(
            parse_flags("CAN_ADD|CHANNEL_SPECIFIC_HANDLES").unwrap(),
            GroupFlags::CAN_ADD | GroupFlags::CHANNEL_SPECIFIC_HANDLES
        );
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");

        let mut config = Config::default();
        config.group.flags = GroupFlags::CAN_ADD | GroupFlags::CAN_REMOVE;
        config.group.self_handle = 1;
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.toml");
        std::fs::write(&path, "[group]\nflags = \"CAN_ADD\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.group.flags, GroupFlags::CAN_ADD);
        assert_eq!(config.logging.level, "info");
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/roster.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
