mod channel;
mod forecast;
mod markers;
mod metrics;
mod snapshot;

pub use channel::{ChannelId, ChannelSpec};
pub use forecast::ForecastResult;
pub use markers::{AnomalyMarker, RetrainMarker, RetrainOutcome};
pub use metrics::{CompositeScore, ModelMetrics};
pub use snapshot::{PipelineState, SeriesSnapshot};
