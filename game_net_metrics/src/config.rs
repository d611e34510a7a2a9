use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The default number of metric events accepted per tick.
pub const DEFAULT_MAX_METRICS_PER_TICK: u64 = 1000;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] ErrorKind);

#[derive(Debug, Error)]
enum ErrorKind {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("max_metrics_per_tick must be greater than 0")]
    InvalidLimit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The maximum number of metric events accepted in a single tick.
    pub max_metrics_per_tick: u64,
    /// Whether gauge updates are rejected once the per-tick limit has been
    /// reached. Gauges never count towards the limit.
    pub gauges_use_budget: bool,
    /// Log the first dropped metric in every tick.
    pub log_dropped: bool,
}

impl Config {
    /// Loads the config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or
    /// contains invalid values.
    pub fn from_file<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let mut file = File::open(path).map_err(ErrorKind::Io)?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(ErrorKind::Io)?;

        let s = std::str::from_utf8(&buf).map_err(ErrorKind::Utf8)?;
        Self::from_toml_str(s)
    }

    /// # Errors
    ///
    /// Returns an error if `s` is not valid TOML or contains invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ErrorKind::Toml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_metrics_per_tick == 0 {
            return Err(ErrorKind::InvalidLimit.into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_metrics_per_tick: DEFAULT_MAX_METRICS_PER_TICK,
            gauges_use_budget: false,
            log_dropped: true,
        }
    }
}
