//! Store errors

use argus_core::{ChannelId, TickIndex};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Insufficient history on {channel}: required {required}, available {available}")]
    InsufficientHistory {
        channel: ChannelId,
        required: usize,
        available: usize,
    },

    #[error("Unknown channel: {0}")]
    UnknownChannel(ChannelId),

    #[error("Expected {expected} channel values, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("Non-finite value {value} for {channel}")]
    NonFinite { channel: ChannelId, value: f64 },

    #[error("Slot {idx} out of range for {channel} (len {len})")]
    SlotOutOfRange {
        channel: ChannelId,
        idx: TickIndex,
        len: usize,
    },

    #[error("Slot {idx} of {channel} already written")]
    SlotOccupied { channel: ChannelId, idx: TickIndex },
}

impl StoreError {
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, StoreError::InsufficientHistory { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
