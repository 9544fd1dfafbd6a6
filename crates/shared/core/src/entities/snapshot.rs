use super::markers::{AnomalyMarker, RetrainMarker};
use crate::values::Timestamp;
use serde::{Deserialize, Serialize};

/// Full state of one channel's series
///
/// `real` has one entry per ingested tick; the derived arrays carry one
/// extra trailing slot reserved for the next tick's forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    /// Channel display name
    pub channel: String,
    /// Ground-truth values
    pub real: Vec<f64>,
    /// Forecast for each index (`None` until resolved)
    pub predicted: Vec<Option<f64>>,
    /// Anomaly markers
    pub anomaly: Vec<Option<AnomalyMarker>>,
    /// Retrain markers
    pub retrain: Vec<Option<RetrainMarker>>,
}

/// Everything a consumer needs to render the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Number of ingested ticks
    pub ticks: usize,
    /// Timestamp of each ingested point, when the source provides one
    pub timestamps: Vec<Option<Timestamp>>,
    /// Per-channel series, in channel order
    pub series: Vec<SeriesSnapshot>,
}

impl PipelineState {
    pub fn channel(&self, name: &str) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|s| s.channel == name)
    }
}
