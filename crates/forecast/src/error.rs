use argus_ports::ModelError;
use argus_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ForecastError {
    pub fn is_insufficient_history(&self) -> bool {
        match self {
            ForecastError::Store(e) => e.is_insufficient_history(),
            ForecastError::Model(ModelError::InsufficientHistory { .. }) => true,
            ForecastError::Model(_) => false,
        }
    }
}
