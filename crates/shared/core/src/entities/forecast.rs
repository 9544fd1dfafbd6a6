use crate::values::TickIndex;
use serde::{Deserialize, Serialize};

/// Output of one prediction job
///
/// Holds one value per channel, in channel order, for the point at
/// `target` (the tick after the window's newest point).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Index of the slot this forecast fills
    pub target: TickIndex,
    /// Forecast value per channel
    pub values: Vec<f64>,
}

impl ForecastResult {
    pub fn new(target: TickIndex, values: Vec<f64>) -> Self {
        Self { target, values }
    }

    pub fn channel_count(&self) -> usize {
        self.values.len()
    }
}
