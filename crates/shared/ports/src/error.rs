use argus_core::TickIndex;
use thiserror::Error;

/// Errors raised by models, trainers and scalers
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Insufficient history: required {required} points, available {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Scaler has not been fitted")]
    NotFitted,

    #[error("Scaler is already fitted; it is fitted once per model lifetime")]
    AlreadyFitted,

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Artifact I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors raised by measurement sources
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("End of data at index {index}")]
    EndOfData { index: TickIndex },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row has {actual} values, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },
}

impl SourceError {
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, SourceError::EndOfData { .. })
    }
}
