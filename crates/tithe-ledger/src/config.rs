//! Ledger configuration.
//!
//! [`LedgerConfig`] is layered from defaults, an optional TOML file, and
//! `TITHE_*` environment variables (nested keys use `__`, e.g.
//! `TITHE_INFLATION__MAX_WINNERS`). Inflation parameters are network-agreed;
//! an explicit `[inflation]` table is only accepted on a standalone network.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tithe_core::constants::NetworkType;
use tithe_inflation::InflationParams;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TITHE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")] Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")] Invalid(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!(
                "unknown log format {other:?} (expected \"text\" or \"json\")"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Configuration for a ledger instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub network: NetworkType,
    /// Log level filter string (e.g. "info", "debug", "tithe_inflation=trace").
    pub log_level: String,
    pub log_format: LogFormat,
    /// Inflation parameter override. Standalone networks only.
    pub inflation: Option<InflationParams>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            network: NetworkType::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            inflation: None,
        }
    }
}

impl LedgerConfig {
    /// Load from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an optional TOML file and the given environment source.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config: Self = builder
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(params) = &self.inflation {
            if self.network != NetworkType::Standalone {
                return Err(ConfigError::Invalid(format!(
                    "inflation parameters are fixed on {:?}; overrides need the standalone network",
                    self.network
                )));
            }
            params.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    /// Inflation parameters in effect for this configuration.
    pub fn inflation_params(&self) -> InflationParams {
        self.inflation
            .clone()
            .unwrap_or_else(|| InflationParams::for_network(self.network))
    }
}
