use serde::{Deserialize, Serialize};

/// Anomaly flagged on one channel at one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyMarker {
    /// One-based channel ordinal
    pub channel: usize,
    /// Z-score of the newest residual
    pub z_score: f64,
}

/// How a retrain run settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrainOutcome {
    /// A candidate beat the active model and was swapped in
    Accepted,
    /// No candidate beat the active model
    Rejected,
    /// Training set construction, training, scoring or persisting failed
    Failed,
}

/// Marker written into the retrain series at the tick that triggered a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrainMarker {
    pub outcome: RetrainOutcome,
    /// Composite score of the best candidate, if any was scored
    pub score: Option<f64>,
    /// Version of the active model after the run
    pub model_version: u64,
}

impl RetrainMarker {
    pub fn accepted(score: f64, model_version: u64) -> Self {
        Self {
            outcome: RetrainOutcome::Accepted,
            score: Some(score),
            model_version,
        }
    }

    pub fn rejected(score: Option<f64>, model_version: u64) -> Self {
        Self {
            outcome: RetrainOutcome::Rejected,
            score,
            model_version,
        }
    }

    pub fn failed(model_version: u64) -> Self {
        Self {
            outcome: RetrainOutcome::Failed,
            score: None,
            model_version,
        }
    }
}
