//! The model currently serving predictions
//!
//! Uses lock-free reads via ArcSwap: prediction jobs take a snapshot once
//! and keep using it even if a retrain swaps the model mid-job.
//!
//! ## Concurrency Model
//! - `current()`: lock-free load of the whole `ActiveModel`
//! - `promote()`: builds the next version and stores it atomically; only the
//!   single-flight retrain job calls it

use argus_core::{CompositeScore, ModelMetrics, Timestamp};
use argus_ports::{ArtifactRef, ForecastModel, Scaler};
use arc_swap::ArcSwap;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Model, the scaler it was fitted with, and its last accepted metrics
#[derive(Debug, Clone)]
pub struct ActiveModel {
    pub version: u64,
    pub model: Arc<dyn ForecastModel>,
    pub scaler: Arc<dyn Scaler>,
    pub metrics: ModelMetrics,
    pub artifact: Option<ArtifactRef>,
    pub deployed_at: Timestamp,
}

impl ActiveModel {
    /// Startup model (version 1)
    pub fn initial(
        model: Arc<dyn ForecastModel>,
        scaler: Arc<dyn Scaler>,
        metrics: ModelMetrics,
        artifact: Option<ArtifactRef>,
    ) -> Self {
        Self {
            version: 1,
            model,
            scaler,
            metrics,
            artifact,
            deployed_at: Utc::now(),
        }
    }

    pub fn score(&self) -> CompositeScore {
        self.metrics.score()
    }

    pub fn summary(&self) -> ActiveModelSummary {
        ActiveModelSummary {
            version: self.version,
            model: self.model.name().to_string(),
            scaler: self.scaler.name().to_string(),
            metrics: self.metrics,
            score: self.score().value(),
            artifact: self.artifact.clone(),
            deployed_at: self.deployed_at,
        }
    }
}

/// Serializable view of the active model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveModelSummary {
    pub version: u64,
    pub model: String,
    pub scaler: String,
    pub metrics: ModelMetrics,
    pub score: f64,
    pub artifact: Option<ArtifactRef>,
    pub deployed_at: Timestamp,
}

#[derive(Debug)]
pub struct ActiveModelCell {
    inner: ArcSwap<ActiveModel>,
}

impl ActiveModelCell {
    pub fn new(initial: ActiveModel) -> Self {
        Self {
            inner: ArcSwap::from_pointee(initial),
        }
    }

    /// Snapshot of the serving model
    pub fn current(&self) -> Arc<ActiveModel> {
        self.inner.load_full()
    }

    pub fn version(&self) -> u64 {
        self.inner.load().version
    }

    /// Replace the serving model; returns the new version
    pub fn promote(
        &self,
        model: Arc<dyn ForecastModel>,
        scaler: Arc<dyn Scaler>,
        metrics: ModelMetrics,
        artifact: Option<ArtifactRef>,
    ) -> u64 {
        let version = self.version() + 1;
        self.inner.store(Arc::new(ActiveModel {
            version,
            model,
            scaler,
            metrics,
            artifact,
            deployed_at: Utc::now(),
        }));
        version
    }
}
