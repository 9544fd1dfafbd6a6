use std::path::Path;
use thiserror::Error;

use super::types::ArgusConfig;
use argus_detect::DriftError;
use argus_executor::ExecutorError;
use argus_retrain::RetrainError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("No channels configured")]
    NoChannels,
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Drift(#[from] DriftError),
    #[error(transparent)]
    Retrain(#[from] RetrainError),
}

/// Load pipeline configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ArgusConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<ArgusConfig, ConfigError> {
    let config: ArgusConfig = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<ArgusConfig, ConfigError> {
    let default_config = include_str!("default_config.json");
    load_config_from_str(default_config)
}

impl ArgusConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid("tick_interval_secs must be positive".into()));
        }
        if self.forecast.window == 0 || self.anomaly.window == 0 {
            return Err(ConfigError::Invalid("windows must be positive".into()));
        }
        if self.model.lags == 0
            || self.model.lags > self.forecast.window
            || self.model.lags > self.retrain.past_window
        {
            return Err(ConfigError::Invalid(format!(
                "lags ({}) must be in 1..={}",
                self.model.lags,
                self.forecast.window.min(self.retrain.past_window)
            )));
        }
        if self.model.artifact.is_none() && self.baseline_rows <= self.forecast.window {
            return Err(ConfigError::Invalid(format!(
                "baseline_rows ({}) must exceed the forecast window ({}) to train a baseline",
                self.baseline_rows, self.forecast.window
            )));
        }
        self.executor.validate()?;
        self.drift.validate()?;
        self.retrain.validate()?;
        Ok(())
    }
}
