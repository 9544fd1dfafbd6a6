//! Fast/slow pool pair shared by the pipeline

use crate::error::ExecutorError;
use crate::pool::WorkerPool;
use crate::tracker::Tracker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;

pub const FAST_WORKERS_MIN: usize = 3;
pub const FAST_WORKERS_MAX: usize = 5;

/// Pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Forecast and anomaly workers (3..=5)
    pub fast_workers: usize,
    /// Retrain workers (>= 1)
    pub slow_workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            fast_workers: FAST_WORKERS_MIN,
            slow_workers: 1,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), ExecutorError> {
        if !(FAST_WORKERS_MIN..=FAST_WORKERS_MAX).contains(&self.fast_workers) {
            return Err(ExecutorError::InvalidCapacity {
                pool: "fast",
                capacity: self.fast_workers,
                min: FAST_WORKERS_MIN,
                max: FAST_WORKERS_MAX,
            });
        }
        if self.slow_workers == 0 {
            return Err(ExecutorError::InvalidCapacity {
                pool: "slow",
                capacity: self.slow_workers,
                min: 1,
                max: usize::MAX,
            });
        }
        Ok(())
    }
}

/// Two independently sized pools with joint idle tracking
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    fast: WorkerPool,
    slow: WorkerPool,
    tracker: Arc<Tracker>,
}

impl TaskExecutor {
    pub fn new(runtime: Handle, config: ExecutorConfig) -> Result<Self, ExecutorError> {
        config.validate()?;
        let tracker = Arc::new(Tracker::default());
        let fast = WorkerPool::with_tracker(
            "fast",
            config.fast_workers,
            runtime.clone(),
            tracker.clone(),
        );
        let slow = WorkerPool::with_tracker("slow", config.slow_workers, runtime, tracker.clone());

        log::info!(
            "[executor] fast pool: {} workers, slow pool: {} workers",
            config.fast_workers,
            config.slow_workers
        );

        Ok(Self {
            fast,
            slow,
            tracker,
        })
    }

    /// Forecast and anomaly jobs
    pub fn fast(&self) -> &WorkerPool {
        &self.fast
    }

    /// Retrain jobs
    pub fn slow(&self) -> &WorkerPool {
        &self.slow
    }

    /// Jobs plus pending callbacks across both pools
    pub fn in_flight(&self) -> usize {
        self.tracker.active()
    }

    /// Resolves once every submitted job and its callback have settled
    pub async fn wait_idle(&self) {
        self.tracker.wait_idle().await;
    }

    /// Reject new work, then drain what is already running
    pub async fn shutdown(&self) {
        self.fast.close();
        self.slow.close();
        log::info!("[executor] shutting down, {} jobs in flight", self.in_flight());
        self.wait_idle().await;
        log::info!("[executor] idle");
    }
}
