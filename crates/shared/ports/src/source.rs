use argus_core::{ChannelSpec, TickIndex, Timestamp};

use crate::error::SourceError;

/// One ground-truth vector (one value per channel)
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// When the measurement was taken, if the source knows
    pub timestamp: Option<Timestamp>,
    /// Value per channel, in channel order
    pub values: Vec<f64>,
}

impl Measurement {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            timestamp: None,
            values,
        }
    }

    pub fn at(timestamp: Timestamp, values: Vec<f64>) -> Self {
        Self {
            timestamp: Some(timestamp),
            values,
        }
    }
}

/// Port for the raw data feed
///
/// Sources are sequential but randomly indexable: the pipeline asks for
/// index `i` on tick `i`, and the startup path reads a baseline prefix.
pub trait MeasurementSource: Send + Sync {
    /// Channels produced by this source, in value order
    fn channels(&self) -> &[ChannelSpec];

    /// Measurement at `idx`, or `SourceError::EndOfData` past the end
    fn next(&self, idx: TickIndex) -> Result<Measurement, SourceError>;

    /// Total number of measurements, when known up front
    fn len(&self) -> Option<usize> {
        None
    }

    /// Get the source's name for logging
    fn name(&self) -> &str {
        "MeasurementSource"
    }
}
