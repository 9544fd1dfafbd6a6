//! Linear autoregressive forecaster
//!
//! Each channel predicts its next value from its own last `lags` values:
//!
//! ```text
//!  y[c] = bias[c] + Σ_k weights[c][k] * x[P - lags + k, c]
//! ```
//!
//! Training starts from persistence (`y = last value`) and runs plain SGD
//! over the walk-forward pairs, all in scaled space.

use crate::artifact::ModelArtifact;
use argus_core::ModelMetrics;
use argus_ports::{
    ArtifactRef, CandidateConfig, ForecastModel, ModelError, ModelResult, ModelTrainer, Pairs,
    RetrainCandidate, Scaler, TrainingSet,
};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearForecaster {
    lags: usize,
    /// `channels x lags`, oldest lag first
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl LinearForecaster {
    pub const KIND: &'static str = "linear_ar";

    /// Model that repeats the last value of every channel
    pub fn persistence(lags: usize, channels: usize) -> Self {
        let lags = lags.max(1);
        let mut row = vec![0.0; lags];
        row[lags - 1] = 1.0;
        Self {
            lags,
            weights: vec![row; channels],
            bias: vec![0.0; channels],
        }
    }

    pub fn from_export(value: serde_json::Value) -> ModelResult<Self> {
        let model: Self = serde_json::from_value(value)?;
        if model.lags == 0
            || model.weights.len() != model.bias.len()
            || model.weights.iter().any(|w| w.len() != model.lags)
        {
            return Err(ModelError::InvalidArtifact(
                "linear model weights do not match its lags".to_string(),
            ));
        }
        Ok(model)
    }

    pub fn lags(&self) -> usize {
        self.lags
    }

    pub fn channels(&self) -> usize {
        self.bias.len()
    }

    fn check(&self, window: &ArrayView2<'_, f64>) -> ModelResult<()> {
        if window.ncols() != self.channels() || window.nrows() < self.lags {
            return Err(ModelError::ShapeMismatch {
                expected: format!(">= {} x {}", self.lags, self.channels()),
                actual: format!("{} x {}", window.nrows(), window.ncols()),
            });
        }
        Ok(())
    }

    fn predict_channel(&self, window: &ArrayView2<'_, f64>, c: usize) -> f64 {
        let start = window.nrows() - self.lags;
        self.weights[c]
            .iter()
            .enumerate()
            .map(|(k, w)| w * window[[start + k, c]])
            .sum::<f64>()
            + self.bias[c]
    }

    /// Run SGD over `pairs`, one step-ahead label per pair
    pub fn fit(&mut self, pairs: &Pairs, config: &CandidateConfig) -> ModelResult<()> {
        if pairs.is_empty() {
            return Err(ModelError::Training("no training pairs".to_string()));
        }
        for _ in 0..config.epochs {
            for i in 0..pairs.len() {
                let window = pairs.window(i);
                self.check(&window)?;
                let label = pairs.label(i);
                let start = window.nrows() - self.lags;

                for c in 0..self.channels() {
                    let error = self.predict_channel(&window, c) - label[[0, c]];
                    for k in 0..self.lags {
                        self.weights[c][k] -= config.learning_rate * error * window[[start + k, c]];
                    }
                    self.bias[c] -= config.learning_rate * error;
                }
            }
            let diverged = self
                .weights
                .iter()
                .flatten()
                .chain(&self.bias)
                .any(|w| !w.is_finite());
            if diverged {
                return Err(ModelError::Training(format!("SGD diverged ({config})")));
            }
        }
        Ok(())
    }
}

impl ForecastModel for LinearForecaster {
    fn predict(&self, window: ArrayView2<'_, f64>) -> ModelResult<Array1<f64>> {
        self.check(&window)?;
        Ok((0..self.channels())
            .map(|c| self.predict_channel(&window, c))
            .collect())
    }

    fn export(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn name(&self) -> &str {
        Self::KIND
    }
}

/// Trains [`LinearForecaster`] candidates and writes their artifacts
#[derive(Debug, Clone)]
pub struct LinearTrainer {
    lags: usize,
    artifact_dir: PathBuf,
}

impl LinearTrainer {
    pub fn new(lags: usize, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            lags: lags.max(1),
            artifact_dir: artifact_dir.into(),
        }
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Train and score a concrete model (used for the baseline as well)
    pub fn train(
        &self,
        set: &TrainingSet,
        config: &CandidateConfig,
    ) -> ModelResult<(LinearForecaster, ModelMetrics)> {
        if set.spec().past < self.lags {
            return Err(ModelError::ShapeMismatch {
                expected: format!("past window >= {} lags", self.lags),
                actual: format!("past window {}", set.spec().past),
            });
        }
        let mut model = LinearForecaster::persistence(self.lags, set.channels());
        model.fit(&set.train, config)?;
        let metrics = set.evaluate(&model)?;
        Ok((model, metrics))
    }
}

impl ModelTrainer for LinearTrainer {
    fn retrain(
        &self,
        set: &TrainingSet,
        config: &CandidateConfig,
    ) -> ModelResult<RetrainCandidate> {
        let (model, metrics) = self.train(set, config)?;
        log::debug!("[trainer] candidate {} scored {}", config, metrics);
        Ok(RetrainCandidate {
            model: Arc::new(model),
            metrics,
            config: *config,
        })
    }

    fn persist(
        &self,
        candidate: &RetrainCandidate,
        scaler: &dyn Scaler,
    ) -> ModelResult<ArtifactRef> {
        let artifact = ModelArtifact::new(
            candidate.model.name(),
            candidate.model.export(),
            scaler.export(),
            candidate.metrics,
            candidate.config,
        );
        let path = artifact.write(&self.artifact_dir)?;
        log::info!("[trainer] artifact written to {}", path);
        Ok(path)
    }

    fn name(&self) -> &str {
        "linear_sgd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::LoadedArtifact;
    use crate::scaler::MinMaxScaler;
    use approx::assert_relative_eq;
    use argus_ports::WindowSpec;
    use ndarray::{Array2, array};

    /// Two channels: a slow sine and a sawtooth
    fn series(points: usize) -> Array2<f64> {
        Array2::from_shape_fn((points, 2), |(t, c)| match c {
            0 => 50.0 + 10.0 * (t as f64 * 0.2).sin(),
            _ => 20.0 + (t % 10) as f64,
        })
    }

    fn training_set(points: usize) -> TrainingSet {
        let data = series(points);
        let mut scaler = MinMaxScaler::new();
        scaler.fit_once(data.view()).unwrap();
        let spec = WindowSpec {
            past: 8,
            horizon: 1,
            validation_fraction: 0.2,
        };
        TrainingSet::walk_forward(data.view(), Arc::new(scaler), spec).unwrap()
    }

    #[test]
    fn test_persistence_repeats_last_value() {
        let model = LinearForecaster::persistence(3, 2);
        let window = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let prediction = model.predict(window.view()).unwrap();
        assert_eq!(prediction.to_vec(), vec![4.0, 40.0]);
    }

    #[test]
    fn test_short_window_is_rejected() {
        let model = LinearForecaster::persistence(5, 1);
        let window = array![[1.0], [2.0]];
        assert!(matches!(
            model.predict(window.view()),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_training_beats_persistence() {
        let set = training_set(200);
        let trainer = LinearTrainer::new(4, "unused");

        let baseline = set.evaluate(&LinearForecaster::persistence(4, 2)).unwrap();
        let candidate = trainer
            .retrain(&set, &CandidateConfig::new(40, 0.05))
            .unwrap();

        assert!(
            candidate.metrics.score().is_better_than(baseline.score()),
            "trained {} vs persistence {}",
            candidate.metrics,
            baseline
        );
        assert_eq!(candidate.config, CandidateConfig::new(40, 0.05));
    }

    #[test]
    fn test_divergence_is_a_training_error() {
        let set = training_set(100);
        let trainer = LinearTrainer::new(4, "unused");
        let err = trainer
            .retrain(&set, &CandidateConfig::new(50, 1e6))
            .unwrap_err();
        assert!(matches!(err, ModelError::Training(_)));
    }

    #[test]
    fn test_lags_longer_than_window_rejected() {
        let set = training_set(100);
        let trainer = LinearTrainer::new(16, "unused");
        assert!(matches!(
            trainer.retrain(&set, &CandidateConfig::new(1, 0.01)),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_persist_and_load_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let set = training_set(120);
        let trainer = LinearTrainer::new(4, dir.path().join("models"));
        let candidate = trainer
            .retrain(&set, &CandidateConfig::new(10, 0.05))
            .unwrap();

        let artifact = trainer.persist(&candidate, &**set.scaler()).unwrap();
        assert!(artifact.path().exists());

        let loaded = LoadedArtifact::load(artifact.path()).unwrap();
        assert_eq!(loaded.model.lags(), 4);
        assert_eq!(loaded.model.channels(), 2);
        assert_relative_eq!(loaded.metrics.mae, candidate.metrics.mae);
        assert_eq!(loaded.config, candidate.config);

        // Restored model predicts exactly like the trained one
        let window = set.validation.window(0);
        let original = candidate.model.predict(window).unwrap();
        let restored = loaded.model.predict(window).unwrap();
        assert_eq!(original, restored);
    }
}
