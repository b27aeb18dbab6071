//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. a TOML file: `cadence.toml` in the working directory if present, or the
//!    explicit path from the builder / `CADENCE_CONFIG_PATH` (then required)
//! 3. environment variables such as `CADENCE__ENGINE__MAX_LOOP_ITERATIONS`
//!
//! A `.env` file is loaded into the process environment first.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "CADENCE_CONFIG_PATH";

const DEFAULT_CONFIG_FILE: &str = "cadence.toml";
const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Limits and bookkeeping for workflow runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Largest number of items a single for loop may iterate over
    #[serde(default = "default_max_loop_iterations")]
    pub max_loop_iterations: usize,

    /// Attach a register snapshot to every completed step
    #[serde(default)]
    pub snapshot_registers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_loop_iterations: default_max_loop_iterations(),
            snapshot_registers: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_max_loop_iterations() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/* ===================== Builder ===================== */

#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    max_loop_iterations: Option<usize>,
    log_level: Option<String>,
}

impl ConfigBuilder {
    /// Explicit config file (overrides `CADENCE_CONFIG_PATH`)
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Override the loop limit regardless of file and environment
    pub fn max_loop_iterations(mut self, limit: Option<usize>) -> Self {
        self.max_loop_iterations = limit;
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    pub fn build(self) -> Result<Config> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&Config::default()).context("Failed to encode defaults")?,
        );

        let explicit = self
            .config_path
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        builder = match &explicit {
            Some(path) => builder.add_source(config::File::from(path.as_path()).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Config = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match &explicit {
                Some(path) => format!("Failed to load configuration from {}", path.display()),
                None => "Failed to load configuration".to_string(),
            })?;

        if let Some(limit) = self.max_loop_iterations {
            config.engine.max_loop_iterations = limit;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }

        Ok(config)
    }
}
