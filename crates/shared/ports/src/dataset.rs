//! Walk-forward training sets
//!
//! A `T x C` series is cut into overlapping `(past, horizon)` pairs by
//! sliding one step at a time:
//!
//! ```text
//! i = 0:   [x0 .. x(P-1)]        -> [xP .. x(P+F-1)]
//! i = 1:     [x1 .. xP]          -> [x(P+1) .. x(P+F)]
//! ...
//! i = T-P-F: last complete pair
//! ```
//!
//! Channels stay the trailing dimension. The trailing share of pairs is
//! held out for validation, so metrics are always measured on the most
//! recent behaviour of the series.

use argus_core::ModelMetrics;
use ndarray::{Array2, Array3, ArrayView2, Axis, s};
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::model::ForecastModel;
use crate::scaler::Scaler;

/// Shape of the walk-forward windows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    /// Past window length (P)
    pub past: usize,
    /// Future label length (F)
    pub horizon: usize,
    /// Share of pairs held out for validation (0.0 ..< 1.0)
    pub validation_fraction: f64,
}

impl WindowSpec {
    /// Minimum number of points that yields one pair
    pub fn min_points(&self) -> usize {
        self.past + self.horizon
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            past: 48,
            horizon: 1,
            validation_fraction: 0.15,
        }
    }
}

/// Feature windows and their labels, both in scaled space
#[derive(Debug, Clone)]
pub struct Pairs {
    /// `N x P x C`
    pub features: Array3<f64>,
    /// `N x F x C`
    pub labels: Array3<f64>,
}

impl Pairs {
    pub fn len(&self) -> usize {
        self.features.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feature window `i` (`P x C`)
    pub fn window(&self, i: usize) -> ArrayView2<'_, f64> {
        self.features.index_axis(Axis(0), i)
    }

    /// Label block `i` (`F x C`)
    pub fn label(&self, i: usize) -> ArrayView2<'_, f64> {
        self.labels.index_axis(Axis(0), i)
    }
}

/// Scaled training and validation pairs plus the scaler that produced them
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub train: Pairs,
    pub validation: Pairs,
    spec: WindowSpec,
    scaler: Arc<dyn Scaler>,
}

impl TrainingSet {
    /// Build pairs from a raw `T x C` series using an already fitted scaler
    ///
    /// Fails with `InsufficientHistory` when fewer than `P + F` points are
    /// available. With a single pair the validation split reuses it.
    pub fn walk_forward(
        series: ArrayView2<'_, f64>,
        scaler: Arc<dyn Scaler>,
        spec: WindowSpec,
    ) -> ModelResult<Self> {
        let points = series.nrows();
        let channels = series.ncols();
        if spec.past == 0 || spec.horizon == 0 {
            return Err(ModelError::Training(
                "past window and horizon must be positive".to_string(),
            ));
        }
        if points < spec.min_points() {
            return Err(ModelError::InsufficientHistory {
                required: spec.min_points(),
                available: points,
            });
        }

        let scaled = scaler.transform(series)?;
        let n = points - spec.min_points() + 1;

        let features = Array3::from_shape_fn((n, spec.past, channels), |(i, j, c)| {
            scaled[[i + j, c]]
        });
        let labels = Array3::from_shape_fn((n, spec.horizon, channels), |(i, j, c)| {
            scaled[[i + spec.past + j, c]]
        });

        let (train, validation) = if n == 1 {
            let pairs = Pairs { features, labels };
            (pairs.clone(), pairs)
        } else {
            let held_out = ((n as f64 * spec.validation_fraction).floor() as usize).clamp(1, n - 1);
            let cut = n - held_out;
            (
                Pairs {
                    features: features.slice(s![..cut, .., ..]).to_owned(),
                    labels: labels.slice(s![..cut, .., ..]).to_owned(),
                },
                Pairs {
                    features: features.slice(s![cut.., .., ..]).to_owned(),
                    labels: labels.slice(s![cut.., .., ..]).to_owned(),
                },
            )
        };

        Ok(Self {
            train,
            validation,
            spec,
            scaler,
        })
    }

    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    pub fn channels(&self) -> usize {
        self.train.features.len_of(Axis(2))
    }

    /// Scaler the pairs were transformed with
    pub fn scaler(&self) -> &Arc<dyn Scaler> {
        &self.scaler
    }

    /// Score a model on the validation split, in raw units
    ///
    /// Only the first step of each label block is compared, since models
    /// forecast one step ahead.
    pub fn evaluate(&self, model: &dyn ForecastModel) -> ModelResult<ModelMetrics> {
        let n = self.validation.len();
        let channels = self.channels();

        let mut predicted = Array2::<f64>::zeros((n, channels));
        for i in 0..n {
            let step = model.predict(self.validation.window(i))?;
            if step.len() != channels {
                return Err(ModelError::ShapeMismatch {
                    expected: format!("{channels} channels"),
                    actual: format!("{} values", step.len()),
                });
            }
            predicted.row_mut(i).assign(&step);
        }
        let actual = self
            .validation
            .labels
            .index_axis(Axis(1), 0)
            .to_owned();

        let predicted = self.scaler.inverse_transform(predicted.view())?;
        let actual = self.scaler.inverse_transform(actual.view())?;

        let actual: Vec<f64> = actual.iter().copied().collect();
        let predicted: Vec<f64> = predicted.iter().copied().collect();
        ModelMetrics::from_predictions(&actual, &predicted).ok_or_else(|| {
            ModelError::Training("validation split is empty".to_string())
        })
    }
}
