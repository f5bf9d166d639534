//! CLI configuration
//!
//! Operator preferences for the `lendbook` binary. Loan terms are fixed by
//! the registry and cannot be configured here. Values come from defaults, a
//! JSON file, then `LENDBOOK_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding [`CliConfig::log_filter`]
pub const ENV_LOG_FILTER: &str = "LENDBOOK_LOG";
/// Environment variable overriding [`CliConfig::default_rate`]
pub const ENV_DEFAULT_RATE: &str = "LENDBOOK_DEFAULT_RATE";
/// Environment variable overriding [`CliConfig::json`]
pub const ENV_JSON: &str = "LENDBOOK_JSON";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Configuration for the `lendbook` binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Interest rate for `quote` when `--rate` is omitted
    #[serde(default = "default_rate")]
    pub default_rate: u32,

    /// Print scenario reports as JSON
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_rate() -> u32 {
    10
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            default_rate: default_rate(),
            json: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LENDBOOK_*` environment overrides
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_LOG_FILTER) {
            self.log_filter = value.trim().to_string();
        }
        if let Some(value) = lookup(ENV_DEFAULT_RATE) {
            self.default_rate = parse(ENV_DEFAULT_RATE, &value)?;
        }
        if let Some(value) = lookup(ENV_JSON) {
            self.json = parse(ENV_JSON, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.env_filter().map(|_| ())
    }

    /// Filter for the tracing subscriber; `RUST_LOG` wins when set
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_filter).map_err(|_| ConfigError::InvalidValue {
            key: "log_filter",
            value: self.log_filter.clone(),
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
