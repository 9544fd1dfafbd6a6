use argus_detect::{AnomalyConfig, DriftConfig};
use argus_executor::ExecutorConfig;
use argus_forecast::ForecastConfig;
use argus_retrain::RetrainConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgusConfig {
    pub source: SourceConfig,
    /// Seconds between driven ticks
    pub tick_interval_secs: u64,
    /// Rows ingested before the first driven tick
    pub history_preload: usize,
    /// Leading source rows the baseline scaler (and baseline model) are fitted on
    pub baseline_rows: usize,
    pub forecast: ForecastConfig,
    pub anomaly: AnomalyConfig,
    pub drift: DriftConfig,
    pub retrain: RetrainConfig,
    pub model: ModelConfig,
    pub executor: ExecutorConfig,
    pub http: HttpConfig,
}

impl Default for ArgusConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            tick_interval_secs: 20,
            history_preload: 48,
            baseline_rows: 365,
            forecast: ForecastConfig::default(),
            anomaly: AnomalyConfig::default(),
            drift: DriftConfig::default(),
            retrain: RetrainConfig::default(),
            model: ModelConfig::default(),
            executor: ExecutorConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// CSV measurement source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Column holding the measurement time, if any
    pub timestamp_column: Option<String>,
    pub channels: Vec<ChannelColumn>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/processed/EEA-SK-Ba-trend.csv"),
            timestamp_column: Some("DatetimeBegin".to_string()),
            channels: vec![
                ChannelColumn::new("PM10", "PM10 Concentration"),
                ChannelColumn::new("PM25", "PM2.5 Concentration"),
                ChannelColumn::new("NO2", "NO2 Concentration"),
            ],
        }
    }
}

/// Maps a channel name to its CSV column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelColumn {
    pub name: String,
    pub column: String,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ChannelColumn {
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            unit: None,
        }
    }
}

/// Startup model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Artifact to start from; when absent a baseline is trained on `baseline_rows`
    pub artifact: Option<PathBuf>,
    /// Autoregressive lags of the linear model
    pub lags: usize,
    pub baseline_epochs: usize,
    pub baseline_learning_rate: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact: None,
            lags: 4,
            baseline_epochs: 30,
            baseline_learning_rate: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}
