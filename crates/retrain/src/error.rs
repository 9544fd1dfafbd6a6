use argus_ports::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrainError {
    #[error("Insufficient history for retraining: required {required}, available {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("All {attempted} candidates failed to train")]
    NoSurvivors { attempted: usize },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid retrain configuration: {0}")]
    InvalidConfig(String),
}

impl RetrainError {
    pub fn is_insufficient_history(&self) -> bool {
        matches!(
            self,
            RetrainError::InsufficientHistory { .. }
                | RetrainError::Model(ModelError::InsufficientHistory { .. })
        )
    }
}
