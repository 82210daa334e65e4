//! # Configuration Management
//!
//! Centralized configuration for the codec, the framed transport adapter and
//! logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`TAGWIRE_*` variables)
//!
//! ## Security Considerations
//! - Every variable-length field (strings, arrays) is bounded by a configured
//!   maximum before any allocation happens
//! - Nesting depth is bounded so hostile streams cannot exhaust the stack
//! - Frames larger than `max_frame_size` are rejected by the transport codec

use crate::error::{Result, WireError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Maximum frame size accepted by the framed transport adapter (16 MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Default maximum UTF-8 byte length of one string value (1 MB)
pub const MAX_STRING_BYTES: usize = 1024 * 1024;

/// Default maximum element count of one array value
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// Default maximum nesting of objects and arrays
pub const MAX_DEPTH: usize = 64;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Codec limits
    #[serde(default)]
    pub codec: CodecConfig,

    /// Framed transport adapter settings
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| WireError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| WireError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| WireError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("TAGWIRE_MAX_STRING_BYTES") {
            config.codec.max_string_bytes = parse_env("TAGWIRE_MAX_STRING_BYTES", &value)?;
        }

        if let Ok(value) = std::env::var("TAGWIRE_MAX_ARRAY_LEN") {
            config.codec.max_array_len = parse_env("TAGWIRE_MAX_ARRAY_LEN", &value)?;
        }

        if let Ok(value) = std::env::var("TAGWIRE_MAX_DEPTH") {
            config.codec.max_depth = parse_env("TAGWIRE_MAX_DEPTH", &value)?;
        }

        if let Ok(value) = std::env::var("TAGWIRE_MAX_FRAME_SIZE") {
            config.transport.max_frame_size = parse_env("TAGWIRE_MAX_FRAME_SIZE", &value)?;
        }

        if let Ok(value) = std::env::var("TAGWIRE_LOG_LEVEL") {
            config.logging.log_level = value
                .parse::<Level>()
                .map_err(|_| WireError::ConfigError(format!("Invalid log level: {value}")))?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| WireError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| WireError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());

        if self.codec.max_string_bytes > self.transport.max_frame_size {
            errors.push(format!(
                "max_string_bytes ({}) cannot exceed max_frame_size ({})",
                self.codec.max_string_bytes, self.transport.max_frame_size
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(WireError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env(name: &str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .map_err(|e| WireError::ConfigError(format!("Invalid value for {name}: {e}")))
}

/// Limits enforced by the encoder and decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Maximum UTF-8 byte length of a single string
    pub max_string_bytes: usize,

    /// Maximum element count of a single array
    pub max_array_len: usize,

    /// Maximum nesting of objects and arrays
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_string_bytes: MAX_STRING_BYTES,
            max_array_len: MAX_ARRAY_LEN,
            max_depth: MAX_DEPTH,
        }
    }
}

impl CodecConfig {
    /// Validate codec limits
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_string_bytes == 0 {
            errors.push("max_string_bytes must be greater than 0".to_string());
        } else if self.max_string_bytes > u32::MAX as usize {
            errors.push(format!(
                "max_string_bytes too large: {} (wire length field is 32-bit)",
                self.max_string_bytes
            ));
        }

        if self.max_array_len == 0 {
            errors.push("max_array_len must be greater than 0".to_string());
        } else if self.max_array_len > u32::MAX as usize {
            errors.push(format!(
                "max_array_len too large: {} (wire count field is 32-bit)",
                self.max_array_len
            ));
        }

        if self.max_depth == 0 {
            errors.push("max_depth must be greater than 0".to_string());
        } else if self.max_depth > 1024 {
            errors.push(format!(
                "max_depth too large: {} (maximum: 1024)",
                self.max_depth
            ));
        }

        errors
    }
}

/// Framed transport adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Maximum allowed frame size in bytes
    pub max_frame_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_frame_size == 0 {
            errors.push("Max frame size cannot be 0".to_string());
        } else if self.max_frame_size < 64 {
            errors.push("Max frame size too small (minimum: 64 bytes)".to_string());
        } else if self.max_frame_size > 100 * 1024 * 1024 {
            errors.push(format!(
                "Max frame size too large: {} bytes (maximum recommended: 100 MB)",
                self.max_frame_size
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("tagwire"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        std::env::set_var("TAGWIRE_MAX_DEPTH", "12");
        std::env::set_var("TAGWIRE_LOG_LEVEL", "debug");
        let config = Config::from_env().unwrap();
        assert_eq!(config.codec.max_depth, 12);
        assert_eq!(config.logging.log_level, Level::DEBUG);
        assert_eq!(config.codec.max_string_bytes, MAX_STRING_BYTES);

        std::env::set_var("TAGWIRE_MAX_DEPTH", "deep");
        assert!(matches!(Config::from_env(), Err(WireError::ConfigError(_))));

        std::env::remove_var("TAGWIRE_MAX_DEPTH");
        std::env::remove_var("TAGWIRE_LOG_LEVEL");
    }
}
