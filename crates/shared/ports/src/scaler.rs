use ndarray::{Array2, ArrayView2};
use std::fmt;

use crate::error::ModelResult;

/// Port for feature scaling
///
/// A scaler is fitted exactly once per model lifetime, against a fixed
/// historical baseline, and then only transforms. A second `fit_once`
/// must fail with `ModelError::AlreadyFitted`.
pub trait Scaler: Send + Sync + fmt::Debug {
    /// Learn the scaling parameters from `baseline` (`rows x channels`)
    fn fit_once(&mut self, baseline: ArrayView2<'_, f64>) -> ModelResult<()>;

    /// Whether `fit_once` has succeeded
    fn is_fitted(&self) -> bool;

    /// Map raw values into model space
    fn transform(&self, data: ArrayView2<'_, f64>) -> ModelResult<Array2<f64>>;

    /// Map model-space values back to raw units
    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> ModelResult<Array2<f64>>;

    /// Unfitted scaler of the same kind (used when a retrain fits its own)
    fn fresh(&self) -> Box<dyn Scaler>;

    /// Fitted parameters, for artifacts
    fn export(&self) -> serde_json::Value;

    fn name(&self) -> &str {
        "Scaler"
    }
}
