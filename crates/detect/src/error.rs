//! Detection errors

use argus_core::{ChannelId, TickIndex};
use argus_store::StoreError;
use thiserror::Error;

/// Why one channel's anomaly evaluation produced no verdict
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnomalyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No prediction paired with point {idx} of {channel}")]
    MissingPrediction { channel: ChannelId, idx: TickIndex },

    #[error("{channel}: {real} real values but {predicted} predictions")]
    LengthMismatch {
        channel: ChannelId,
        real: usize,
        predicted: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriftError {
    #[error("Drift ensemble watches {expected} channels, got {actual} values")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Invalid drift configuration: {0}")]
    InvalidConfig(String),
}
