use crate::config::ConfigError;
use argus_detect::DriftError;
use argus_executor::ExecutorError;
use argus_ports::{ModelError, SourceError};
use argus_store::StoreError;
use thiserror::Error;

/// Errors that reach the caller of `Pipeline::new` or `Pipeline::tick`
///
/// Background job failures never show up here; they are logged where the
/// job completes.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Startup model: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Drift(#[from] DriftError),
}

impl PipelineError {
    /// The source has no more measurements
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, PipelineError::Source(e) if e.is_end_of_data())
    }
}
