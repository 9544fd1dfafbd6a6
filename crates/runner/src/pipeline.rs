//! Pipeline session
//!
//! Owns every component and runs the per-tick control flow:
//!
//! ```text
//!  tick():
//!    source.next(idx) ─► store.advance ─► drift.evaluate ─┬─► retrain.request  (slow pool, if drifted)
//!                                                         ├─► forecaster.submit (fast pool)
//!                                                         └─► anomaly.submit    (fast pool)
//! ```
//!
//! A tick never waits for a job. Ticks are serialized by the drift lock, so
//! concurrent callers (driver and HTTP) cannot interleave.

use crate::config::ArgusConfig;
use crate::error::PipelineError;
use argus_core::{PipelineState, TickIndex, Timestamp};
use argus_detect::{AnomalyDetector, DriftEnsemble, DriftSignal};
use argus_executor::{JobId, TaskExecutor};
use argus_forecast::{
    ActiveModel, ActiveModelCell, ActiveModelSummary, ForecastOrchestrator, LinearTrainer,
    LoadedArtifact, MinMaxScaler,
};
use argus_ports::{
    CandidateConfig, MeasurementSource, ModelError, Scaler, SourceError, TrainingSet, WindowSpec,
};
use argus_retrain::{RetrainAdmission, RetrainCoordinator};
use argus_store::{SharedStore, WindowedStore};
use ndarray::Array2;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;

/// What one tick did
#[derive(Debug, Clone)]
pub struct TickReport {
    pub idx: TickIndex,
    pub timestamp: Option<Timestamp>,
    pub drift: DriftSignal,
    /// Present when drift triggered a retrain request
    pub retrain: Option<RetrainAdmission>,
    pub forecast: Option<JobId>,
    pub anomaly: Option<JobId>,
}

pub struct Pipeline {
    config: ArgusConfig,
    source: Arc<dyn MeasurementSource>,
    store: SharedStore,
    executor: TaskExecutor,
    active: Arc<ActiveModelCell>,
    forecaster: ForecastOrchestrator,
    anomaly: AnomalyDetector,
    retrain: RetrainCoordinator,
    drift: Mutex<DriftEnsemble>,
}

impl Pipeline {
    /// Build every component, load or train the startup model, and preload history
    pub fn new(
        config: ArgusConfig,
        source: Arc<dyn MeasurementSource>,
        runtime: Handle,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let channels = source.channels().to_vec();
        if channels.is_empty() {
            return Err(crate::config::ConfigError::NoChannels.into());
        }

        let store = WindowedStore::new(channels.clone()).into_shared();
        let executor = TaskExecutor::new(runtime, config.executor)?;
        let active = Arc::new(ActiveModelCell::new(bootstrap_model(&config, &*source)?));
        log::info!("[pipeline] startup model: {:?}", active.current().summary());

        let trainer = Arc::new(LinearTrainer::new(
            config.model.lags,
            &config.retrain.artifact_dir,
        ));
        let forecaster = ForecastOrchestrator::new(
            config.forecast,
            store.clone(),
            executor.fast().clone(),
            active.clone(),
        );
        let anomaly = AnomalyDetector::new(config.anomaly, store.clone(), executor.fast().clone());
        let retrain = RetrainCoordinator::new(
            config.retrain.clone(),
            store.clone(),
            executor.slow().clone(),
            active.clone(),
            trainer,
        );
        let drift = DriftEnsemble::from_config(
            &config.drift,
            channels.len(),
            config.retrain.data_gathering_period,
        )?;

        let pipeline = Self {
            config,
            source,
            store,
            executor,
            active,
            forecaster,
            anomaly,
            retrain,
            drift: Mutex::new(drift),
        };
        pipeline.preload()?;

        log::info!(
            "App started: {} channels from '{}', {} rows preloaded",
            channels.len(),
            pipeline.source.name(),
            pipeline.ticks()
        );
        Ok(pipeline)
    }

    /// Ingest the first `history_preload` rows without scheduling any job
    ///
    /// The drift detectors still see these values so that their grace
    /// period starts at the beginning of the series.
    fn preload(&self) -> Result<(), PipelineError> {
        let mut drift = self.drift.lock();
        for idx in 0..self.config.history_preload {
            let measurement = match self.source.next(idx) {
                Ok(m) => m,
                Err(e) if e.is_end_of_data() => {
                    log::warn!("[pipeline] source ended during preload at row {}", idx);
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            self.store
                .lock()
                .advance(&measurement.values, measurement.timestamp)?;
            drift.evaluate(&measurement.values)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &ArgusConfig {
        &self.config
    }

    /// Number of ingested points
    pub fn ticks(&self) -> usize {
        self.store.lock().len()
    }

    /// Ingest the next measurement and schedule the background work for it
    ///
    /// Synchronous: it holds the drift and store locks for one drift update
    /// and never waits on a job. Async callers that should not occupy a
    /// runtime worker run it through `spawn_blocking`.
    pub fn tick(&self) -> Result<TickReport, PipelineError> {
        let mut drift = self.drift.lock();

        let next = self.store.lock().len();
        let measurement = self.source.next(next)?;
        let idx = self
            .store
            .lock()
            .advance(&measurement.values, measurement.timestamp)?;
        log::info!("Data updated (tick {})", idx);

        let signal = drift.evaluate(&measurement.values)?;
        let retrain = signal.drifted.then(|| {
            log::info!("[pipeline] drift on {:?} at tick {}", signal.channels, idx);
            self.retrain.request(idx)
        });

        let forecast = match self.forecaster.submit(idx) {
            Ok(job) => Some(job),
            Err(e) => {
                log::debug!("[pipeline] no forecast at tick {}: {}", idx, e);
                None
            }
        };
        let anomaly = match self.anomaly.submit(idx) {
            Ok(job) => Some(job),
            Err(e) => {
                log::debug!("[pipeline] no anomaly check at tick {}: {}", idx, e);
                None
            }
        };

        Ok(TickReport {
            idx,
            timestamp: measurement.timestamp,
            drift: signal,
            retrain,
            forecast,
            anomaly,
        })
    }

    /// Full state, regardless of freshness
    pub fn full_state(&self) -> PipelineState {
        self.store.lock().snapshot()
    }

    /// State if anything changed since the last successful poll
    pub fn poll_fresh(&self) -> Option<PipelineState> {
        let mut store = self.store.lock();
        store.take_fresh().then(|| store.snapshot())
    }

    /// Manually trigger a retrain at the latest tick
    pub fn request_retrain(&self) -> RetrainAdmission {
        let last = self.store.lock().last_index();
        match last {
            Some(idx) => self.retrain.request(idx),
            None => RetrainAdmission::Dropped {
                required: self.config.retrain.min_points(),
                available: 0,
            },
        }
    }

    pub fn is_retraining(&self) -> bool {
        self.retrain.is_retraining()
    }

    pub fn active_model(&self) -> ActiveModelSummary {
        self.active.current().summary()
    }

    /// Jobs and callbacks still outstanding
    pub fn in_flight(&self) -> usize {
        self.executor.in_flight()
    }

    /// Wait until every submitted job has completed and been written back
    pub async fn settle(&self) {
        self.executor.wait_idle().await;
    }

    /// Whether `shutdown` has closed the worker pools
    pub fn is_shut_down(&self) -> bool {
        self.executor.fast().is_closed() && self.executor.slow().is_closed()
    }

    /// Stop accepting jobs and drain the ones in flight
    pub async fn shutdown(&self) {
        self.executor.shutdown().await;
        log::info!("[pipeline] shut down after {} ticks", self.ticks());
    }
}

/// Load the configured artifact, or train a baseline on the leading rows
fn bootstrap_model(
    config: &ArgusConfig,
    source: &dyn MeasurementSource,
) -> Result<ActiveModel, PipelineError> {
    let channels = source.channels().len();

    if let Some(path) = &config.model.artifact {
        let loaded = LoadedArtifact::load(path)?;
        if loaded.model.channels() != channels {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{channels} channels"),
                actual: format!("artifact with {} channels", loaded.model.channels()),
            }
            .into());
        }
        return Ok(ActiveModel::initial(
            Arc::new(loaded.model),
            Arc::new(loaded.scaler),
            loaded.metrics,
            Some(loaded.artifact),
        ));
    }

    let baseline = read_prefix(source, config.baseline_rows)?;
    let mut scaler = MinMaxScaler::new();
    scaler.fit_once(baseline.view())?;
    let scaler: Arc<dyn Scaler> = Arc::new(scaler);

    let spec = WindowSpec {
        past: config.forecast.window,
        horizon: 1,
        validation_fraction: config.retrain.validation_fraction,
    };
    let set = TrainingSet::walk_forward(baseline.view(), scaler.clone(), spec)?;
    let trainer = LinearTrainer::new(config.model.lags, &config.retrain.artifact_dir);
    let (model, metrics) = trainer.train(
        &set,
        &CandidateConfig::new(config.model.baseline_epochs, config.model.baseline_learning_rate),
    )?;
    log::info!(
        "[pipeline] baseline model trained on {} rows: {}",
        baseline.nrows(),
        metrics
    );

    Ok(ActiveModel::initial(Arc::new(model), scaler, metrics, None))
}

/// Up to `rows` leading measurements as a `rows x C` matrix
fn read_prefix(source: &dyn MeasurementSource, rows: usize) -> Result<Array2<f64>, PipelineError> {
    let channels = source.channels().len();
    let mut values = Vec::with_capacity(rows * channels);
    let mut read = 0;
    for idx in 0..rows {
        let measurement = match source.next(idx) {
            Ok(m) => m,
            Err(e) if e.is_end_of_data() => break,
            Err(e) => return Err(e.into()),
        };
        if measurement.values.len() != channels {
            return Err(SourceError::WidthMismatch {
                expected: channels,
                actual: measurement.values.len(),
            }
            .into());
        }
        values.extend(measurement.values);
        read += 1;
    }

    Array2::from_shape_vec((read, channels), values).map_err(|e| {
        ModelError::ShapeMismatch {
            expected: format!("{read} x {channels}"),
            actual: e.to_string(),
        }
        .into()
    })
}
