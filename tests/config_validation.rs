//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use tagwire::config::{CodecConfig, Config, LoggingConfig, TransportConfig};
use tagwire::WireError;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = Config::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_zero_max_string_bytes() {
    let mut config = Config::default();
    config.codec.max_string_bytes = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("max_string_bytes must be greater than 0")));
}

#[test]
fn test_zero_max_array_len() {
    let mut config = Config::default();
    config.codec.max_array_len = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("max_array_len must be greater than 0")));
}

#[test]
fn test_zero_max_depth() {
    let mut config = Config::default();
    config.codec.max_depth = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("max_depth must be greater than 0")));
}

#[test]
fn test_excessive_max_depth() {
    let mut config = Config::default();
    config.codec.max_depth = 5000;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("max_depth too large")));
}

#[test]
fn test_zero_max_frame_size() {
    let mut config = Config::default();
    config.transport.max_frame_size = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Max frame size cannot be 0")));
}

#[test]
fn test_tiny_max_frame_size() {
    let mut config = Config::default();
    config.transport.max_frame_size = 16;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Max frame size too small")));
}

#[test]
fn test_excessive_max_frame_size() {
    let mut config = Config::default();
    config.transport.max_frame_size = 200 * 1024 * 1024;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Max frame size too large")));
}

#[test]
fn test_string_limit_larger_than_frame() {
    let mut config = Config::default();
    config.transport.max_frame_size = 4096;
    config.codec.max_string_bytes = 8192;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("cannot exceed max_frame_size")));
}

#[test]
fn test_empty_app_name() {
    let mut config = Config::default();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Application name cannot be empty")));
}

#[test]
fn test_long_app_name() {
    let mut config = Config::default();
    config.logging.app_name = "a".repeat(100);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Application name too long")));
}

#[test]
fn test_validate_strict_with_valid_config() {
    let config = Config::default();
    assert!(config.validate_strict().is_ok());
}

#[test]
fn test_validate_strict_with_invalid_config() {
    let mut config = Config::default();
    config.codec.max_depth = 0;

    let result = config.validate_strict();
    match result {
        Err(WireError::ConfigError(msg)) => {
            assert!(msg.contains("Configuration validation failed"))
        }
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_multiple_validation_errors() {
    let mut config = Config::default();
    config.codec.max_string_bytes = 0;
    config.codec.max_array_len = 0;
    config.codec.max_depth = 0;
    config.transport.max_frame_size = 0;
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(
        errors.len() >= 5,
        "Expected at least 5 errors, got {}: {:?}",
        errors.len(),
        errors
    );
}

#[test]
fn test_toml_roundtrip_through_file() {
    let config = Config::default_with_overrides(|c| {
        c.codec.max_depth = 16;
        c.logging.log_level = Level::DEBUG;
    });

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tagwire.toml");
    config.save_to_file(&path).expect("save config");

    let loaded = Config::from_file(&path).expect("load config");
    assert_eq!(loaded.codec.max_depth, 16);
    assert_eq!(loaded.logging.log_level, Level::DEBUG);
    assert_eq!(loaded.transport.max_frame_size, config.transport.max_frame_size);
}

#[test]
fn test_example_config_parses() {
    let example = Config::example_config();
    let parsed = Config::from_toml(&example).expect("example config should parse");
    assert_eq!(parsed.codec, CodecConfig::default());
}

#[test]
fn test_partial_toml_uses_section_defaults() {
    let parsed = Config::from_toml(
        r#"
        [transport]
        max_frame_size = 65536
        "#,
    )
    .expect("partial config should parse");

    assert_eq!(parsed.transport.max_frame_size, 65536);
    assert_eq!(parsed.codec, CodecConfig::default());
    assert_eq!(parsed.logging.app_name, "tagwire");
}

#[test]
fn test_invalid_log_level_rejected() {
    let result = Config::from_toml(
        r#"
        [logging]
        app_name = "svc"
        log_level = "loud"
        json_format = false
        "#,
    );
    assert!(matches!(result, Err(WireError::ConfigError(_))));
}

#[test]
fn test_missing_file_is_config_error() {
    let result = Config::from_file("/nonexistent/tagwire.toml");
    assert!(matches!(result, Err(WireError::ConfigError(_))));
}

#[test]
fn test_valid_production_config() {
    let config = Config {
        codec: CodecConfig {
            max_string_bytes: 64 * 1024,
            max_array_len: 100_000,
            max_depth: 32,
        },
        transport: TransportConfig {
            max_frame_size: 4 * 1024 * 1024,
        },
        logging: LoggingConfig {
            app_name: "production-server".to_string(),
            log_level: Level::INFO,
            json_format: true,
        },
    };

    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Production config should be valid, got: {:?}",
        errors
    );
}
