//! Executor errors

use thiserror::Error;

/// Why a job did not produce a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Job panicked: {0}")]
    Panicked(String),

    #[error("Job was cancelled before completing")]
    Cancelled,

    #[error("Pool '{pool}' is shut down")]
    ShutDown { pool: String },
}

impl TaskError {
    /// Wrap any displayable error as a job failure
    pub fn failed(err: impl std::fmt::Display) -> Self {
        TaskError::Failed(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Pool '{pool}' capacity {capacity} outside {min}..={max}")]
    InvalidCapacity {
        pool: &'static str,
        capacity: usize,
        min: usize,
        max: usize,
    },
}
