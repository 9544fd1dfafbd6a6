//! Windowed store

use crate::error::{StoreError, StoreResult};
use crate::series::SensorSeries;
use argus_core::{
    AnomalyMarker, ChannelId, ChannelSpec, ForecastResult, PipelineState, RetrainMarker,
    TickIndex, Timestamp,
};
use ndarray::Array2;
use parking_lot::Mutex;
use std::sync::Arc;

/// Store shared between the tick path and job completions
///
/// The mutex is the single-writer discipline: every mutation, whether
/// from `tick()` or from a completion callback, takes this lock.
pub type SharedStore = Arc<Mutex<WindowedStore>>;

/// Append-only, index-aligned series for all channels
#[derive(Debug, Clone)]
pub struct WindowedStore {
    series: Vec<SensorSeries>,
    timestamps: Vec<Option<Timestamp>>,
    /// Set by every successful mutation, cleared by `take_fresh`
    fresh: bool,
}

impl WindowedStore {
    pub fn new(channels: Vec<ChannelSpec>) -> Self {
        let series = channels
            .into_iter()
            .enumerate()
            .map(|(i, spec)| SensorSeries::new(ChannelId::new(i), spec))
            .collect();

        Self {
            series,
            timestamps: Vec::new(),
            fresh: false,
        }
    }

    /// Wrap into the shared, lock-guarded form
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn channel_count(&self) -> usize {
        self.series.len()
    }

    pub fn channel_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.series.iter().map(SensorSeries::id)
    }

    pub fn series(&self, channel: ChannelId) -> StoreResult<&SensorSeries> {
        self.series
            .get(channel.index())
            .ok_or(StoreError::UnknownChannel(channel))
    }

    fn series_mut(&mut self, channel: ChannelId) -> StoreResult<&mut SensorSeries> {
        self.series
            .get_mut(channel.index())
            .ok_or(StoreError::UnknownChannel(channel))
    }

    /// Number of ingested ticks
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Index of the newest real point
    pub fn last_index(&self) -> Option<TickIndex> {
        self.len().checked_sub(1)
    }

    /// Append one value per channel and reserve the next derived slot
    ///
    /// Returns the index of the appended point. The store is left untouched
    /// when the input is rejected.
    pub fn advance(
        &mut self,
        values: &[f64],
        timestamp: Option<Timestamp>,
    ) -> StoreResult<TickIndex> {
        if values.len() != self.series.len() {
            return Err(StoreError::ChannelCountMismatch {
                expected: self.series.len(),
                actual: values.len(),
            });
        }
        if let Some((i, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(StoreError::NonFinite {
                channel: ChannelId::new(i),
                value,
            });
        }

        for (series, &value) in self.series.iter_mut().zip(values) {
            series.push(value);
        }
        self.timestamps.push(timestamp);
        self.fresh = true;

        Ok(self.len() - 1)
    }

    /// Last `k` real values of one channel, borrowed
    pub fn window(&self, channel: ChannelId, k: usize) -> StoreResult<&[f64]> {
        self.series(channel)?.window(k)
    }

    /// Predictions paired with `window(channel, k)`
    pub fn predicted_window(&self, channel: ChannelId, k: usize) -> StoreResult<&[Option<f64>]> {
        self.series(channel)?.predicted_window(k)
    }

    /// Last `k` points of every channel as a `k x C` matrix
    ///
    /// Fails on the first channel that is short of history.
    pub fn window_matrix(&self, k: usize) -> StoreResult<Array2<f64>> {
        let mut matrix = Array2::<f64>::zeros((k, self.series.len()));
        for (c, series) in self.series.iter().enumerate() {
            let window = series.window(k)?;
            for (t, &value) in window.iter().enumerate() {
                matrix[[t, c]] = value;
            }
        }
        Ok(matrix)
    }

    /// Up to `limit` most recent points of every channel (`rows x C`)
    pub fn recent_matrix(&self, limit: usize) -> Array2<f64> {
        let rows = self.len().min(limit);
        // `rows <= len` on every channel, so the windows cannot fail
        self.window_matrix(rows)
            .unwrap_or_else(|_| Array2::zeros((0, self.series.len())))
    }

    /// Fill one reserved prediction slot
    pub fn record_prediction(
        &mut self,
        idx: TickIndex,
        channel: ChannelId,
        value: f64,
    ) -> StoreResult<()> {
        self.series_mut(channel)?.set_prediction(idx, value)?;
        self.fresh = true;
        Ok(())
    }

    /// Fill the prediction slot of every channel from one forecast
    ///
    /// All slots are checked before any is written, so a rejected forecast
    /// leaves no partial writes behind.
    pub fn record_forecast(&mut self, forecast: &ForecastResult) -> StoreResult<()> {
        if forecast.values.len() != self.series.len() {
            return Err(StoreError::ChannelCountMismatch {
                expected: self.series.len(),
                actual: forecast.values.len(),
            });
        }
        for series in &self.series {
            series.check_prediction_slot(forecast.target)?;
        }
        for (series, &value) in self.series.iter_mut().zip(&forecast.values) {
            series.set_prediction(forecast.target, value)?;
        }
        self.fresh = true;
        Ok(())
    }

    /// Fill one reserved anomaly slot
    pub fn record_anomaly(
        &mut self,
        idx: TickIndex,
        channel: ChannelId,
        marker: AnomalyMarker,
    ) -> StoreResult<()> {
        self.series_mut(channel)?.set_anomaly(idx, marker)?;
        self.fresh = true;
        Ok(())
    }

    /// Fill the retrain slot of every channel
    pub fn record_retrain_marker(
        &mut self,
        idx: TickIndex,
        marker: RetrainMarker,
    ) -> StoreResult<()> {
        for series in &self.series {
            series.check_retrain_slot(idx)?;
        }
        for series in &mut self.series {
            series.set_retrain(idx, marker)?;
        }
        self.fresh = true;
        Ok(())
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Return the freshness flag and clear it
    pub fn take_fresh(&mut self) -> bool {
        std::mem::replace(&mut self.fresh, false)
    }

    /// Copy of the full state
    pub fn snapshot(&self) -> PipelineState {
        PipelineState {
            ticks: self.len(),
            timestamps: self.timestamps.clone(),
            series: self.series.iter().map(SensorSeries::snapshot).collect(),
        }
    }
}
