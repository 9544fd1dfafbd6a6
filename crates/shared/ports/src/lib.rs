//! Argus Ports
//!
//! Port definitions (traits) for the Argus sensor pipeline.
//! These define the boundaries between the orchestration engine and the
//! algorithms it drives: where measurements come from, how a window is
//! scaled, how a model predicts and is retrained, and how a channel's
//! distribution change is detected.
//!
//! The walk-forward training set lives here as well, because both the
//! baseline bootstrap and every retrain run build it the same way.

mod dataset;
mod detector;
mod error;
mod model;
mod scaler;
mod source;

pub use dataset::{Pairs, TrainingSet, WindowSpec};
pub use detector::ChangeDetector;
pub use error::{ModelError, ModelResult, SourceError};
pub use model::{ArtifactRef, CandidateConfig, ForecastModel, ModelTrainer, RetrainCandidate};
pub use scaler::Scaler;
pub use source::{Measurement, MeasurementSource};
