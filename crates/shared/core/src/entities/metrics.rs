//! Forecast quality metrics
//!
//! Candidate models are ranked by a single composite score:
//!
//! ```text
//! score = MAE + 0.5 * MAPE + 0.5 * RMSE      (lower is better)
//! ```
//!
//! MAPE is expressed as a percentage and guards against zero actuals the
//! same way the usual training toolkits do (denominator clamped to
//! `MAPE_EPSILON`).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Smallest denominator used when computing MAPE
pub const MAPE_EPSILON: f64 = 1e-7;

const MAPE_WEIGHT: f64 = 0.5;
const RMSE_WEIGHT: f64 = 0.5;

/// Error metrics of a model over a validation set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Mean absolute percentage error (percent)
    pub mape: f64,
    /// Root mean squared error
    pub rmse: f64,
}

impl ModelMetrics {
    pub fn new(mae: f64, mape: f64, rmse: f64) -> Self {
        Self { mae, mape, rmse }
    }

    /// Compute metrics from paired actual/predicted values
    ///
    /// Returns `None` when the inputs are empty or of different length.
    pub fn from_predictions(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        if actual.is_empty() || actual.len() != predicted.len() {
            return None;
        }

        let n = actual.len() as f64;
        let mut abs_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut sq_sum = 0.0;

        for (&y, &p) in actual.iter().zip(predicted) {
            let err = y - p;
            abs_sum += err.abs();
            pct_sum += err.abs() / y.abs().max(MAPE_EPSILON);
            sq_sum += err * err;
        }

        Some(Self {
            mae: abs_sum / n,
            mape: 100.0 * pct_sum / n,
            rmse: (sq_sum / n).sqrt(),
        })
    }

    /// Composite score used to rank models
    pub fn score(&self) -> CompositeScore {
        CompositeScore(self.mae + MAPE_WEIGHT * self.mape + RMSE_WEIGHT * self.rmse)
    }
}

impl fmt::Display for ModelMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE={:.4} MAPE={:.2}% RMSE={:.4} score={:.4}",
            self.mae,
            self.mape,
            self.rmse,
            self.score().value()
        )
    }
}

/// Weighted model score (lower is better)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeScore(f64);

impl CompositeScore {
    pub const fn from_value(value: f64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Strict improvement: ties and NaN never count as better
    pub fn is_better_than(self, other: CompositeScore) -> bool {
        self.0.partial_cmp(&other.0) == Some(Ordering::Less)
    }
}

impl fmt::Display for CompositeScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_metrics_from_predictions() {
        let actual = [10.0, 20.0, 40.0];
        let predicted = [12.0, 18.0, 40.0];

        let m = ModelMetrics::from_predictions(&actual, &predicted).unwrap();

        assert_relative_eq!(m.mae, 4.0 / 3.0, epsilon = 1e-12);
        // (0.2 + 0.1 + 0.0) / 3 * 100
        assert_relative_eq!(m.mape, 10.0, epsilon = 1e-9);
        assert_relative_eq!(m.rmse, (8.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_metrics_reject_mismatched_input() {
        assert!(ModelMetrics::from_predictions(&[], &[]).is_none());
        assert!(ModelMetrics::from_predictions(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn test_zero_actual_is_clamped() {
        let m = ModelMetrics::from_predictions(&[0.0], &[0.0]).unwrap();
        assert_eq!(m.mape, 0.0);

        let m = ModelMetrics::from_predictions(&[0.0], &[1e-7]).unwrap();
        assert!(m.mape.is_finite());
    }

    #[test]
    fn test_composite_score_weights() {
        let m = ModelMetrics::new(1.0, 4.0, 2.0);
        assert_relative_eq!(m.score().value(), 1.0 + 2.0 + 1.0);
    }

    #[test]
    fn test_score_improvement_is_strict() {
        let five = CompositeScore::from_value(5.0);

        assert!(CompositeScore::from_value(4.5).is_better_than(five));
        assert!(!CompositeScore::from_value(5.0).is_better_than(five));
        assert!(!CompositeScore::from_value(5.1).is_better_than(five));
        assert!(!CompositeScore::from_value(f64::NAN).is_better_than(five));
    }
}
