use argus_core::ModelMetrics;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dataset::TrainingSet;
use crate::error::ModelResult;
use crate::scaler::Scaler;

/// Port for a fitted forecasting model
///
/// Models work in scaled space: the window handed to `predict` has already
/// been transformed by the model's scaler, and the returned vector is
/// inverse-transformed by the caller.
pub trait ForecastModel: Send + Sync + fmt::Debug {
    /// Predict the next step from a `past x channels` window
    fn predict(&self, window: ArrayView2<'_, f64>) -> ModelResult<Array1<f64>>;

    /// Model parameters, for artifacts
    fn export(&self) -> serde_json::Value;

    /// Get the model's name for logging
    fn name(&self) -> &str {
        "ForecastModel"
    }
}

/// Hyperparameters of one retrain candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Passes over the training pairs
    pub epochs: usize,
    /// Step size
    pub learning_rate: f64,
}

impl CandidateConfig {
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        Self {
            epochs,
            learning_rate,
        }
    }
}

impl fmt::Display for CandidateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epochs={} lr={}", self.epochs, self.learning_rate)
    }
}

/// A trained model and how well it did on the validation split
#[derive(Debug, Clone)]
pub struct RetrainCandidate {
    pub model: Arc<dyn ForecastModel>,
    pub metrics: ModelMetrics,
    pub config: CandidateConfig,
}

/// Location of a persisted model artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(PathBuf);

impl ArtifactRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Port for the training side of a model family
///
/// The learning algorithm itself is opaque to the pipeline; it only needs
/// to turn a training set and a configuration into a scored candidate, and
/// to persist an accepted candidate.
pub trait ModelTrainer: Send + Sync {
    /// Train one candidate and score it on the set's validation split
    fn retrain(
        &self,
        set: &TrainingSet,
        config: &CandidateConfig,
    ) -> ModelResult<RetrainCandidate>;

    /// Write the candidate (and the scaler it was trained with) to durable storage
    fn persist(
        &self,
        candidate: &RetrainCandidate,
        scaler: &dyn Scaler,
    ) -> ModelResult<ArtifactRef>;

    /// Get the trainer's name for logging
    fn name(&self) -> &str {
        "ModelTrainer"
    }
}
