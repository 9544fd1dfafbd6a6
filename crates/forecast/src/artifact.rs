//! JSON model artifacts
//!
//! One file per accepted model:
//!
//! ```json
//! {
//!   "id": "…", "created_at": "…", "model_kind": "linear_ar",
//!   "model": { … }, "scaler": { … },
//!   "metrics": { "mae": …, "mape": …, "rmse": … },
//!   "config": { "epochs": …, "learning_rate": … }
//! }
//! ```

use crate::linear::LinearForecaster;
use crate::scaler::MinMaxScaler;
use argus_core::{ModelMetrics, Timestamp};
use argus_ports::{ArtifactRef, CandidateConfig, ModelError, ModelResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub id: Uuid,
    pub created_at: Timestamp,
    pub model_kind: String,
    pub model: serde_json::Value,
    pub scaler: serde_json::Value,
    pub metrics: ModelMetrics,
    pub config: CandidateConfig,
}

impl ModelArtifact {
    pub fn new(
        model_kind: impl Into<String>,
        model: serde_json::Value,
        scaler: serde_json::Value,
        metrics: ModelMetrics,
        config: CandidateConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model_kind: model_kind.into(),
            model,
            scaler,
            metrics,
            config,
        }
    }

    /// Write into `dir` (created if missing) under a unique name
    pub fn write(&self, dir: &Path) -> ModelResult<ArtifactRef> {
        fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;

        let file_name = format!(
            "{}-{}-{}.json",
            self.model_kind,
            self.created_at.format("%Y%m%dT%H%M%S"),
            self.id.simple()
        );
        let path = dir.join(file_name);
        let file = fs::File::create(&path).map_err(|source| io_error(&path, source))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;

        Ok(ArtifactRef::new(path))
    }

    pub fn read(path: &Path) -> ModelResult<Self> {
        let file = fs::File::open(path).map_err(|source| io_error(path, source))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ModelError {
    ModelError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// A linear model restored from disk, with the scaler it was trained with
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub model: LinearForecaster,
    pub scaler: MinMaxScaler,
    pub metrics: ModelMetrics,
    pub config: CandidateConfig,
    pub artifact: ArtifactRef,
}

impl LoadedArtifact {
    pub fn load(path: &Path) -> ModelResult<Self> {
        let artifact = ModelArtifact::read(path)?;
        if artifact.model_kind != LinearForecaster::KIND {
            return Err(ModelError::InvalidArtifact(format!(
                "unsupported model kind '{}'",
                artifact.model_kind
            )));
        }
        let model = LinearForecaster::from_export(artifact.model)?;
        let scaler = MinMaxScaler::from_export(artifact.scaler)?;
        if scaler.channels() != Some(model.channels()) {
            return Err(ModelError::InvalidArtifact(format!(
                "model has {} channels, scaler {:?}",
                model.channels(),
                scaler.channels()
            )));
        }

        log::info!(
            "[artifact] loaded {} (created {}, {})",
            path.display(),
            artifact.created_at,
            artifact.metrics
        );

        Ok(Self {
            model,
            scaler,
            metrics: artifact.metrics,
            config: artifact.config,
            artifact: ArtifactRef::new(path),
        })
    }
}
