//! Tests for configuration loading and graceful degradation
//!
//! Covers:
//! - Missing config files fall back to compiled defaults
//! - Partial TOML files are completed with defaults
//! - Invalid values are rejected
//! - CLI argument beats environment variable
//!
//! Tests that touch SIGMON_CONFIG are marked #[serial] so they do not race.

use serial_test::serial;
use sigmon_common::config::{ConfigResolver, LoggingConfig, TomlConfig, CONFIG_ENV_VAR};
use sigmon_common::Error;
use std::env;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_partial_toml_fills_defaults() {
    let config = TomlConfig::from_toml_str(
        r#"
        api_base_url = "http://monitor.local"
        suppress_duplicates = true

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.api_base_url, "http://monitor.local");
    assert!(config.suppress_duplicates);
    assert_eq!(config.logging, LoggingConfig { level: "debug".to_string() });
    assert_eq!(config.push_event, "new_data");
    assert_eq!(config.insight_window, 5);
    assert_eq!(config.bind_addr, "127.0.0.1:5780");
}

#[test]
fn test_empty_toml_is_default() {
    assert_eq!(TomlConfig::from_toml_str("").unwrap(), TomlConfig::default());
}

#[test]
fn test_invalid_values_rejected() {
    for content in [
        r#"api_base_url = "  ""#,
        "event_bus_capacity = 0",
        "insight_window = 0",
        r#"push_event = """#,
    ] {
        let err = TomlConfig::from_toml_str(content).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{} should be rejected", content);
    }
}

#[test]
fn test_malformed_toml_rejected() {
    let err = TomlConfig::from_toml_str("api_base_url = [").unwrap_err();
    assert!(err.to_string().contains("Invalid TOML"));
}

#[test]
#[serial]
fn test_cli_path_loaded() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "cli.toml", r#"bind_addr = "0.0.0.0:9000""#);

    let config = ConfigResolver::default().load(Some(&path)).unwrap();
    assert_eq!(config.bind_addr, "0.0.0.0:9000");
}

#[test]
#[serial]
fn test_env_path_loaded() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "env.toml", "reconnect_delay_ms = 250");
    env::set_var(CONFIG_ENV_VAR, &path);

    let config = ConfigResolver::default().load(None).unwrap();
    assert_eq!(config.reconnect_delay_ms, 250);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_beats_env() {
    let dir = TempDir::new().unwrap();
    let env_path = write_config(&dir, "env.toml", "insight_window = 7");
    let cli_path = write_config(&dir, "cli.toml", "insight_window = 9");
    env::set_var(CONFIG_ENV_VAR, &env_path);

    let config = ConfigResolver::default().load(Some(&cli_path)).unwrap();
    assert_eq!(config.insight_window, 9);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = ConfigResolver::default().load(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
#[serial]
fn test_custom_env_var_name() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "custom.toml", "request_timeout_ms = 1500");
    env::set_var("SIGMON_TEST_CONFIG_PATH", &path);

    let config = ConfigResolver::new("SIGMON_TEST_CONFIG_PATH").load(None).unwrap();
    assert_eq!(config.request_timeout_ms, 1500);

    env::remove_var("SIGMON_TEST_CONFIG_PATH");
}
