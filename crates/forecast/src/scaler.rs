//! Per-channel min-max scaling into `[0, 1]`

use argus_ports::{ModelError, ModelResult, Scaler};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Bounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    bounds: Option<Bounds>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a fitted scaler from stored bounds
    pub fn from_bounds(min: Vec<f64>, max: Vec<f64>) -> ModelResult<Self> {
        if min.len() != max.len() || min.is_empty() {
            return Err(ModelError::InvalidArtifact(format!(
                "scaler bounds have {} minima and {} maxima",
                min.len(),
                max.len()
            )));
        }
        if min.iter().zip(&max).any(|(lo, hi)| !(lo.is_finite() && hi.is_finite()) || lo > hi) {
            return Err(ModelError::InvalidArtifact("scaler bounds out of order".to_string()));
        }
        Ok(Self {
            bounds: Some(Bounds { min, max }),
        })
    }

    /// Restore from the value written by `export`
    pub fn from_export(value: serde_json::Value) -> ModelResult<Self> {
        let scaler: Self = serde_json::from_value(value)?;
        match scaler.bounds {
            Some(Bounds { min, max }) => Self::from_bounds(min, max),
            None => Err(ModelError::InvalidArtifact("scaler was never fitted".to_string())),
        }
    }

    pub fn channels(&self) -> Option<usize> {
        self.bounds.as_ref().map(|b| b.min.len())
    }

    fn fitted(&self, data: &ArrayView2<'_, f64>) -> ModelResult<&Bounds> {
        let bounds = self.bounds.as_ref().ok_or(ModelError::NotFitted)?;
        if data.ncols() != bounds.min.len() {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} channels", bounds.min.len()),
                actual: format!("{} columns", data.ncols()),
            });
        }
        Ok(bounds)
    }
}

/// Constant channels map to 0 instead of dividing by zero
fn range(lo: f64, hi: f64) -> f64 {
    let r = hi - lo;
    if r == 0.0 { 1.0 } else { r }
}

impl Scaler for MinMaxScaler {
    fn fit_once(&mut self, baseline: ArrayView2<'_, f64>) -> ModelResult<()> {
        if self.bounds.is_some() {
            return Err(ModelError::AlreadyFitted);
        }
        if baseline.nrows() == 0 || baseline.ncols() == 0 {
            return Err(ModelError::InsufficientHistory {
                required: 1,
                available: baseline.nrows(),
            });
        }

        let mut min = Vec::with_capacity(baseline.ncols());
        let mut max = Vec::with_capacity(baseline.ncols());
        for column in baseline.axis_iter(Axis(1)) {
            let lo = column.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !(lo.is_finite() && hi.is_finite()) {
                return Err(ModelError::Training("baseline contains non-finite values".to_string()));
            }
            min.push(lo);
            max.push(hi);
        }
        self.bounds = Some(Bounds { min, max });
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.bounds.is_some()
    }

    fn transform(&self, data: ArrayView2<'_, f64>) -> ModelResult<Array2<f64>> {
        let bounds = self.fitted(&data)?;
        let mut out = data.to_owned();
        for (c, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, hi) = (bounds.min[c], bounds.max[c]);
            column.mapv_inplace(|x| (x - lo) / range(lo, hi));
        }
        Ok(out)
    }

    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> ModelResult<Array2<f64>> {
        let bounds = self.fitted(&data)?;
        let mut out = data.to_owned();
        for (c, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, hi) = (bounds.min[c], bounds.max[c]);
            column.mapv_inplace(|x| x * range(lo, hi) + lo);
        }
        Ok(out)
    }

    fn fresh(&self) -> Box<dyn Scaler> {
        Box::new(MinMaxScaler::new())
    }

    fn export(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn name(&self) -> &str {
        "min_max"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn assert_close(actual: &Array2<f64>, expected: &Array2<f64>) {
        assert_eq!(actual.dim(), expected.dim());
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fit_and_transform() {
        let mut scaler = MinMaxScaler::new();
        scaler
            .fit_once(array![[0.0, 10.0], [5.0, 20.0], [10.0, 30.0]].view())
            .unwrap();

        let scaled = scaler.transform(array![[5.0, 30.0], [15.0, 0.0]].view()).unwrap();
        assert_close(&scaled, &array![[0.5, 1.0], [1.5, -0.5]]);

        let back = scaler.inverse_transform(scaled.view()).unwrap();
        assert_close(&back, &array![[5.0, 30.0], [15.0, 0.0]]);
    }

    #[test]
    fn test_second_fit_is_rejected() {
        let mut scaler = MinMaxScaler::new();
        scaler.fit_once(array![[1.0], [2.0]].view()).unwrap();

        let err = scaler.fit_once(array![[100.0], [200.0]].view()).unwrap_err();
        assert!(matches!(err, ModelError::AlreadyFitted));
        // Original bounds survive
        let scaled = scaler.transform(array![[2.0]].view()).unwrap();
        assert_abs_diff_eq!(scaled[[0, 0]], 1.0);
    }

    #[test]
    fn test_unfitted_scaler_refuses_to_transform() {
        let scaler = MinMaxScaler::new();
        assert!(matches!(
            scaler.transform(array![[1.0]].view()),
            Err(ModelError::NotFitted)
        ));
    }

    #[test]
    fn test_constant_channel() {
        let mut scaler = MinMaxScaler::new();
        scaler.fit_once(array![[4.0], [4.0]].view()).unwrap();
        let scaled = scaler.transform(array![[4.0], [5.0]].view()).unwrap();
        assert_close(&scaled, &array![[0.0], [1.0]]);
    }

    #[test]
    fn test_width_mismatch() {
        let mut scaler = MinMaxScaler::new();
        scaler.fit_once(array![[1.0, 2.0]].view()).unwrap();
        assert!(matches!(
            scaler.transform(array![[1.0]].view()),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_export_restores_bounds() {
        let mut scaler = MinMaxScaler::new();
        scaler.fit_once(array![[1.0, -3.0], [9.0, 3.0]].view()).unwrap();

        let restored = MinMaxScaler::from_export(scaler.export()).unwrap();
        assert_eq!(restored, scaler);
        assert!(restored.is_fitted());

        let fresh = scaler.fresh();
        assert!(!fresh.is_fitted());
    }
}
