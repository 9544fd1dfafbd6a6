//! Per-channel series

use crate::error::{StoreError, StoreResult};
use argus_core::{AnomalyMarker, ChannelId, ChannelSpec, RetrainMarker, SeriesSnapshot, TickIndex};

/// The four index-aligned arrays of one channel
#[derive(Debug, Clone)]
pub struct SensorSeries {
    id: ChannelId,
    spec: ChannelSpec,
    real: Vec<f64>,
    predicted: Vec<Option<f64>>,
    anomaly: Vec<Option<AnomalyMarker>>,
    retrain: Vec<Option<RetrainMarker>>,
}

impl SensorSeries {
    /// Empty series with the first reserved slot in place
    pub fn new(id: ChannelId, spec: ChannelSpec) -> Self {
        Self {
            id,
            spec,
            real: Vec::new(),
            predicted: vec![None],
            anomaly: vec![None],
            retrain: vec![None],
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    pub fn real(&self) -> &[f64] {
        &self.real
    }

    pub fn predicted(&self) -> &[Option<f64>] {
        &self.predicted
    }

    pub fn anomaly(&self) -> &[Option<AnomalyMarker>] {
        &self.anomaly
    }

    pub fn retrain(&self) -> &[Option<RetrainMarker>] {
        &self.retrain
    }

    /// Number of real points
    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub(crate) fn push(&mut self, value: f64) {
        self.real.push(value);
        self.predicted.push(None);
        self.anomaly.push(None);
        self.retrain.push(None);
    }

    /// Last `k` real values
    pub fn window(&self, k: usize) -> StoreResult<&[f64]> {
        let available = self.real.len();
        if available < k {
            return Err(StoreError::InsufficientHistory {
                channel: self.id,
                required: k,
                available,
            });
        }
        Ok(&self.real[available - k..])
    }

    /// Predictions paired index-for-index with `window(k)`
    pub fn predicted_window(&self, k: usize) -> StoreResult<&[Option<f64>]> {
        let available = self.real.len();
        if available < k {
            return Err(StoreError::InsufficientHistory {
                channel: self.id,
                required: k,
                available,
            });
        }
        Ok(&self.predicted[available - k..available])
    }

    pub(crate) fn check_prediction_slot(&self, idx: TickIndex) -> StoreResult<()> {
        check_slot(self.id, &self.predicted, idx)
    }

    pub(crate) fn check_retrain_slot(&self, idx: TickIndex) -> StoreResult<()> {
        check_slot(self.id, &self.retrain, idx)
    }

    pub(crate) fn set_prediction(&mut self, idx: TickIndex, value: f64) -> StoreResult<()> {
        fill(self.id, &mut self.predicted, idx, value)
    }

    pub(crate) fn set_anomaly(&mut self, idx: TickIndex, marker: AnomalyMarker) -> StoreResult<()> {
        fill(self.id, &mut self.anomaly, idx, marker)
    }

    pub(crate) fn set_retrain(&mut self, idx: TickIndex, marker: RetrainMarker) -> StoreResult<()> {
        fill(self.id, &mut self.retrain, idx, marker)
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            channel: self.spec.name.clone(),
            real: self.real.clone(),
            predicted: self.predicted.clone(),
            anomaly: self.anomaly.clone(),
            retrain: self.retrain.clone(),
        }
    }
}

fn check_slot<T>(channel: ChannelId, slots: &[Option<T>], idx: TickIndex) -> StoreResult<()> {
    match slots.get(idx) {
        None => Err(StoreError::SlotOutOfRange {
            channel,
            idx,
            len: slots.len(),
        }),
        Some(Some(_)) => Err(StoreError::SlotOccupied { channel, idx }),
        Some(None) => Ok(()),
    }
}

fn fill<T>(
    channel: ChannelId,
    slots: &mut [Option<T>],
    idx: TickIndex,
    value: T,
) -> StoreResult<()> {
    check_slot(channel, slots, idx)?;
    slots[idx] = Some(value);
    Ok(())
}
