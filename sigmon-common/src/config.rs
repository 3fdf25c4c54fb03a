//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a single TOML file. Resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `SIGMON_CONFIG` environment variable
//! 3. `~/.config/sigmon/config.toml`
//! 4. `/etc/sigmon/config.toml`
//!
//! A missing file at the default locations is not an error: compiled
//! defaults are used and a warning is logged. A file named explicitly
//! (CLI or environment) must exist.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::time::millis_to_duration;
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SIGMON_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Base URL of the monitoring REST service (bulk read is `{base}/data`)
    pub api_base_url: String,

    /// SSE endpoint delivering new measurements; `{api_base_url}/events` if unset
    pub push_url: Option<String>,

    /// Push event name carrying new measurements
    pub push_event: String,

    /// Address the read API listens on
    pub bind_addr: String,

    pub request_timeout_ms: u64,

    /// Delay before the push client reconnects after a disconnect
    pub reconnect_delay_ms: u64,

    /// Suppress repeat notifications for the same location and timestamp
    pub suppress_duplicates: bool,

    /// Most recent measurements considered by the insight generator
    pub insight_window: usize,

    pub event_bus_capacity: usize,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.ocrapp.biz.id".to_string(),
            push_url: None,
            push_event: "new_data".to_string(),
            bind_addr: "127.0.0.1:5780".to_string(),
            request_timeout_ms: 30_000,
            reconnect_delay_ms: 3_000,
            suppress_duplicates: false,
            insight_window: crate::insights::DEFAULT_INSIGHT_WINDOW,
            event_bus_capacity: 256,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config("api_base_url must not be empty".to_string()));
        }
        if self.push_event.trim().is_empty() {
            return Err(Error::Config("push_event must not be empty".to_string()));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::Config("event_bus_capacity must be greater than 0".to_string()));
        }
        if self.insight_window == 0 {
            return Err(Error::Config("insight_window must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Bulk read endpoint
    pub fn data_url(&self) -> String {
        format!("{}/data", self.api_base_url.trim_end_matches('/'))
    }

    /// SSE endpoint, defaulting to `{api_base_url}/events`
    pub fn push_url(&self) -> String {
        match &self.push_url {
            Some(url) => url.clone(),
            None => format!("{}/events", self.api_base_url.trim_end_matches('/')),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        millis_to_duration(self.request_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        millis_to_duration(self.reconnect_delay_ms)
    }
}

/// Locates and loads the configuration file
pub struct ConfigResolver {
    env_var_name: String,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new(CONFIG_ENV_VAR)
    }
}

impl ConfigResolver {
    pub fn new(env_var_name: &str) -> Self {
        Self {
            env_var_name: env_var_name.to_string(),
        }
    }

    /// Explicitly requested path: CLI argument, then environment
    fn explicit_path(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }
        std::env::var(&self.env_var_name).ok().map(PathBuf::from)
    }

    /// First existing default location, if any
    fn default_path() -> Option<PathBuf> {
        let user_config = dirs::config_dir().map(|d| d.join("sigmon").join("config.toml"));
        let system_config = PathBuf::from("/etc/sigmon/config.toml");

        user_config
            .into_iter()
            .chain(std::iter::once(system_config))
            .find(|p| p.exists())
    }

    /// Load configuration following the resolution order
    pub fn load(&self, cli_arg: Option<&Path>) -> Result<TomlConfig> {
        if let Some(path) = self.explicit_path(cli_arg) {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading configuration from {}", path.display());
            return TomlConfig::load(&path);
        }

        match Self::default_path() {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)
            }
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}
