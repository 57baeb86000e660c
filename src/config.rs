//! Configuration loading from TOML files and environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use crate::tracking::{EtaConfig, ProgressionConfig, SessionConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Pending requests the order store actor will queue.
    pub buffer_size: usize,
    /// Store changes buffered per subscriber before it starts lagging.
    pub change_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            change_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub progression: ProgressionConfig,
    pub eta: EtaConfig,
    pub session: SessionConfig,
    pub store: StoreConfig,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    pub const ENV_STAGE_MINUTES: &'static str = "ORDER_TRACKER_STAGE_MINUTES";
    pub const ENV_REFRESH_SECS: &'static str = "ORDER_TRACKER_REFRESH_SECS";
    /// Upper bound for every minute-valued setting (one week).
    pub const MAX_MINUTES: i64 = 7 * 24 * 60;

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TrackingConfig, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<TrackingConfig, ConfigError> {
        let config: TrackingConfig = toml::from_str(contents)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn from_env_and_file(file_path: Option<&Path>) -> Result<TrackingConfig, ConfigError> {
        let mut config = match file_path {
            Some(path) => Self::from_file(path)?,
            None => TrackingConfig::default(),
        };

        Self::apply_overrides(&mut config, |name| std::env::var(name).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn apply_overrides(
        config: &mut TrackingConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(Self::ENV_STAGE_MINUTES) {
            debug!("Overriding stage minutes from environment");
            config.progression.stage_minutes = value.parse().map_err(|_| ConfigError::Env {
                name: Self::ENV_STAGE_MINUTES,
                value,
            })?;
        }
        if let Some(value) = lookup(Self::ENV_REFRESH_SECS) {
            debug!("Overriding refresh interval from environment");
            config.session.refresh_interval_secs = value.parse().map_err(|_| ConfigError::Env {
                name: Self::ENV_REFRESH_SECS,
                value,
            })?;
        }
        Ok(())
    }

    pub fn validate(config: &TrackingConfig) -> Result<(), ConfigError> {
        let minutes_in_range = |value: i64| (1..=Self::MAX_MINUTES).contains(&value);
        if !minutes_in_range(config.progression.stage_minutes) {
            return Err(ConfigError::Invalid(format!(
                "progression.stage_minutes must be between 1 and {}",
                Self::MAX_MINUTES
            )));
        }
        if !minutes_in_range(config.eta.phase_minutes) {
            return Err(ConfigError::Invalid(format!(
                "eta.phase_minutes must be between 1 and {}",
                Self::MAX_MINUTES
            )));
        }
        let floor_in_range = |value: i64| (0..=Self::MAX_MINUTES).contains(&value);
        if !floor_in_range(config.eta.min_remaining_minutes)
            || !floor_in_range(config.eta.final_min_remaining_minutes)
        {
            return Err(ConfigError::Invalid(format!(
                "eta floors must be between 0 and {}",
                Self::MAX_MINUTES
            )));
        }
        if config.session.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid("session.refresh_interval_secs must be positive".into()));
        }
        if config.store.buffer_size == 0 || config.store.change_capacity == 0 {
            return Err(ConfigError::Invalid("store capacities must be positive".into()));
        }
        Ok(())
    }
}
