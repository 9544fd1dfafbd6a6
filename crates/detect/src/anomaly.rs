//! Residual z-score anomaly detection
//!
//! For each channel the newest residual `real - predicted` is compared with
//! the residuals of the last `window` points. A channel whose window has no
//! spread (`std == 0`) is never flagged.

use crate::error::AnomalyError;
use argus_core::{AnomalyMarker, ChannelId, TickIndex};
use argus_executor::{JobId, TaskError, WorkerPool};
use argus_store::SharedStore;
use serde::{Deserialize, Serialize};

/// Configuration for anomaly detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Number of recent points whose residuals are compared
    pub window: usize,
    /// Z-score above which the newest residual is anomalous
    pub z_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: 16,
            z_threshold: 3.0,
        }
    }
}

/// Evaluate one channel's window
///
/// `first_idx` is the series index of `real[0]`, used only for error
/// reporting. Returns `Ok(None)` when the newest residual is within bounds.
pub fn evaluate_channel(
    channel: ChannelId,
    first_idx: TickIndex,
    real: &[f64],
    predicted: &[Option<f64>],
    z_threshold: f64,
) -> Result<Option<AnomalyMarker>, AnomalyError> {
    if real.len() != predicted.len() {
        return Err(AnomalyError::LengthMismatch {
            channel,
            real: real.len(),
            predicted: predicted.len(),
        });
    }
    if real.is_empty() {
        return Ok(None);
    }

    let mut residuals = Vec::with_capacity(real.len());
    for (offset, (&r, p)) in real.iter().zip(predicted).enumerate() {
        let p = p.ok_or(AnomalyError::MissingPrediction {
            channel,
            idx: first_idx + offset,
        })?;
        residuals.push(r - p);
    }

    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return Ok(None);
    }

    let newest = residuals[residuals.len() - 1];
    let z_score = (newest - mean).abs() / std;
    if z_score > z_threshold {
        Ok(Some(AnomalyMarker {
            channel: channel.ordinal(),
            z_score,
        }))
    } else {
        Ok(None)
    }
}

struct ChannelWindow {
    channel: ChannelId,
    real: Vec<f64>,
    predicted: Vec<Option<f64>>,
}

type ChannelVerdict = (ChannelId, Result<Option<AnomalyMarker>, AnomalyError>);

/// Submits anomaly evaluations to the fast pool and writes markers back
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
    store: SharedStore,
    pool: WorkerPool,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig, store: SharedStore, pool: WorkerPool) -> Self {
        Self {
            config,
            store,
            pool,
        }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Evaluate every channel at tick `idx` in the background
    ///
    /// The windows are copied under the store lock before the job is
    /// submitted. Fails without submitting anything while the store holds
    /// fewer than `window` points.
    pub fn submit(&self, idx: TickIndex) -> Result<JobId, AnomalyError> {
        let window = self.config.window;
        let (first_idx, windows) = {
            let store = self.store.lock();
            let mut windows = Vec::with_capacity(store.channel_count());
            for channel in store.channel_ids() {
                let series = store.series(channel)?;
                windows.push(ChannelWindow {
                    channel,
                    real: series.window(window)?.to_vec(),
                    predicted: series.predicted_window(window)?.to_vec(),
                });
            }
            (store.len() - window, windows)
        };

        let z_threshold = self.config.z_threshold;
        let handle = self.pool.submit(format!("anomaly@{idx}"), move || {
            let verdicts: Vec<ChannelVerdict> = windows
                .into_iter()
                .map(|w| {
                    let verdict =
                        evaluate_channel(w.channel, first_idx, &w.real, &w.predicted, z_threshold);
                    (w.channel, verdict)
                })
                .collect();
            Ok::<_, TaskError>(verdicts)
        });
        let id = handle.id();

        let store = self.store.clone();
        handle.on_complete(move |result| match result {
            Ok(verdicts) => write_markers(&store, idx, verdicts),
            Err(e) => log::error!("[anomaly] evaluation at tick {} failed: {}", idx, e),
        });

        Ok(id)
    }
}

fn write_markers(store: &SharedStore, idx: TickIndex, verdicts: Vec<ChannelVerdict>) {
    let mut store = store.lock();
    for (channel, verdict) in verdicts {
        match verdict {
            Ok(Some(marker)) => {
                log::warn!(
                    "[anomaly] {} at tick {}: z = {:.2}",
                    channel,
                    idx,
                    marker.z_score
                );
                if let Err(e) = store.record_anomaly(idx, channel, marker) {
                    log::error!("[anomaly] could not record marker: {}", e);
                }
            }
            Ok(None) => {}
            // Expected until enough forecasts have landed
            Err(e @ AnomalyError::MissingPrediction { .. }) => {
                log::debug!("[anomaly] skipped {}: {}", channel, e)
            }
            Err(e) => log::warn!("[anomaly] skipped {}: {}", channel, e),
        }
    }
}
