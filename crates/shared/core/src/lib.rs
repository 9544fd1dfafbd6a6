//! Argus Core Domain
//!
//! Pure domain types for the Argus sensor pipeline.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Markers written back into the series
    AnomalyMarker,
    // Channels
    ChannelId,
    ChannelSpec,
    // Model quality
    CompositeScore,
    // Forecast output
    ForecastResult,
    ModelMetrics,
    // Exposed state
    PipelineState,
    RetrainMarker,
    RetrainOutcome,
    SeriesSnapshot,
};
pub use values::{TickIndex, Timestamp};
