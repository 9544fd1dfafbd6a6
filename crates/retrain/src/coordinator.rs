//! Single-flight retrain admission and the retrain job itself

use crate::config::RetrainConfig;
use crate::error::RetrainError;
use crate::selection::select_candidate;
use argus_core::{CompositeScore, RetrainMarker, TickIndex};
use argus_executor::{JobId, TaskError, WorkerPool};
use argus_forecast::ActiveModelCell;
use argus_ports::{ArtifactRef, ModelTrainer, RetrainCandidate, Scaler, TrainingSet};
use argus_store::SharedStore;
use ndarray::Array2;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Answer to a retrain request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrainAdmission {
    /// A retrain job was submitted
    Accepted(JobId),
    /// Another retrain is running; this request is dropped
    AlreadyInProgress,
    /// Not enough history to build a single training pair
    Dropped { required: usize, available: usize },
    /// A retrain was already admitted for this trigger tick, whose marker
    /// slot is taken
    AlreadyMarked { trigger_idx: TickIndex },
}

/// How a retrain run ended when nothing failed
#[derive(Debug, Clone, PartialEq)]
pub enum RetrainDecision {
    Accepted {
        version: u64,
        score: CompositeScore,
        artifact: ArtifactRef,
    },
    Rejected {
        best: CompositeScore,
        active: CompositeScore,
    },
}

/// Clears the in-flight flag when dropped
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RetrainCoordinator {
    config: RetrainConfig,
    store: SharedStore,
    pool: WorkerPool,
    active: Arc<ActiveModelCell>,
    trainer: Arc<dyn ModelTrainer>,
    in_flight: Arc<AtomicBool>,
    /// One past the last admitted trigger tick (0 when none)
    last_trigger: AtomicUsize,
}

impl RetrainCoordinator {
    pub fn new(
        config: RetrainConfig,
        store: SharedStore,
        pool: WorkerPool,
        active: Arc<ActiveModelCell>,
        trainer: Arc<dyn ModelTrainer>,
    ) -> Self {
        Self {
            config,
            store,
            pool,
            active,
            trainer,
            in_flight: Arc::new(AtomicBool::new(false)),
            last_trigger: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &RetrainConfig {
        &self.config
    }

    pub fn is_retraining(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a retrain unless one is already running
    ///
    /// Never blocks. The outcome is written as a retrain marker into slot
    /// `trigger_idx` once the job settles.
    pub fn request(&self, trigger_idx: TickIndex) -> RetrainAdmission {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::info!("retrain already in progress (trigger at tick {})", trigger_idx);
            return RetrainAdmission::AlreadyInProgress;
        }
        let guard = InFlightGuard(self.in_flight.clone());

        // Only the guard holder reaches this point, so load and store cannot race
        if trigger_idx < self.last_trigger.load(Ordering::Acquire) {
            log::info!("retrain already ran for tick {}", trigger_idx);
            return RetrainAdmission::AlreadyMarked { trigger_idx };
        }

        let data = self
            .store
            .lock()
            .recent_matrix(self.config.data_gathering_period);
        let required = self.config.min_points();
        if data.nrows() < required {
            log::warn!(
                "[retrain] dropped at tick {}: {} points gathered, {} required",
                trigger_idx,
                data.nrows(),
                required
            );
            return RetrainAdmission::Dropped {
                required,
                available: data.nrows(),
            };
        }

        self.last_trigger.store(trigger_idx + 1, Ordering::Release);
        log::info!(
            "[retrain] started at tick {} on {} points, {} candidates",
            trigger_idx,
            data.nrows(),
            self.config.candidates.len()
        );

        let active = self.active.clone();
        let trainer = self.trainer.clone();
        let config = self.config.clone();
        let handle = self.pool.submit(format!("retrain@{trigger_idx}"), move || {
            let _guard = guard;
            run_retrain(data, &active, &*trainer, &config).map_err(TaskError::failed)
        });
        let id = handle.id();

        let store = self.store.clone();
        let active = self.active.clone();
        handle.on_complete(move |result| {
            let marker = match result {
                Ok(RetrainDecision::Accepted { version, score, .. }) => {
                    RetrainMarker::accepted(score.value(), version)
                }
                Ok(RetrainDecision::Rejected { best, .. }) => {
                    RetrainMarker::rejected(Some(best.value()), active.version())
                }
                Err(e) => {
                    log::error!("[retrain] failed, keeping active model: {}", e);
                    RetrainMarker::failed(active.version())
                }
            };
            if let Err(e) = store.lock().record_retrain_marker(trigger_idx, marker) {
                log::error!("[retrain] could not record marker: {}", e);
            }
        });

        RetrainAdmission::Accepted(id)
    }
}

/// Train every candidate on `data` and promote the best one if it wins
///
/// The scaler is a fresh instance of the active model's kind, fitted once
/// on `data`. The active model is touched only on acceptance, after the
/// artifact has been persisted.
pub fn run_retrain(
    data: Array2<f64>,
    active: &ActiveModelCell,
    trainer: &dyn ModelTrainer,
    config: &RetrainConfig,
) -> Result<RetrainDecision, RetrainError> {
    let spec = config.window_spec();
    if data.nrows() < spec.min_points() {
        return Err(RetrainError::InsufficientHistory {
            required: spec.min_points(),
            available: data.nrows(),
        });
    }

    let current = active.current();
    let mut scaler = current.scaler.fresh();
    scaler.fit_once(data.view())?;
    let scaler: Arc<dyn Scaler> = Arc::from(scaler);

    let set = TrainingSet::walk_forward(data.view(), scaler.clone(), spec)?;

    let candidates: Vec<RetrainCandidate> = config
        .candidates
        .iter()
        .filter_map(|candidate| match trainer.retrain(&set, candidate) {
            Ok(trained) => {
                log::info!("[retrain] candidate {}: {}", candidate, trained.metrics);
                Some(trained)
            }
            Err(e) => {
                log::warn!("[retrain] candidate {} failed: {}", candidate, e);
                None
            }
        })
        .collect();
    if candidates.is_empty() {
        return Err(RetrainError::NoSurvivors {
            attempted: config.candidates.len(),
        });
    }

    let scores: Vec<CompositeScore> = candidates.iter().map(|c| c.metrics.score()).collect();
    let active_score = current.score();

    match select_candidate(active_score, &scores) {
        Some(winner) => {
            let best = &candidates[winner];
            let artifact = trainer.persist(best, &*scaler)?;
            let version = active.promote(
                best.model.clone(),
                scaler,
                best.metrics,
                Some(artifact.clone()),
            );
            log::info!(
                "[retrain] accepted {} (score {} < {}), model v{} deployed",
                best.config,
                scores[winner],
                active_score,
                version
            );
            Ok(RetrainDecision::Accepted {
                version,
                score: scores[winner],
                artifact,
            })
        }
        None => {
            let best = scores
                .iter()
                .copied()
                .filter(|s| !s.value().is_nan())
                .min_by(|a, b| a.value().total_cmp(&b.value()))
                .unwrap_or(CompositeScore::from_value(f64::NAN));
            log::info!(
                "[retrain] rejected: best score {} does not beat active {}",
                best,
                active_score
            );
            Ok(RetrainDecision::Rejected {
                best,
                active: active_score,
            })
        }
    }
}
