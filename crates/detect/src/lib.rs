//! Argus Detect - Anomaly and Drift Detection
//!
//! Two independent checks run on every tick:
//!
//! ```text
//!                   ┌─────────────────────────────┐
//!  advance(values) ─┤ DriftEnsemble (synchronous) ├─► DriftSignal ──► retrain request
//!                   └─────────────────────────────┘
//!                   ┌─────────────────────────────┐
//!  submit(idx) ─────┤ AnomalyDetector (fast pool) ├─► anomaly[idx] markers
//!                   └─────────────────────────────┘
//! ```
//!
//! ## Anomaly
//! Residuals `real - predicted` over the last `window` points of a channel;
//! the newest residual is flagged when its z-score exceeds `z_threshold`.
//!
//! ## Drift
//! One [`ChangeDetector`](argus_ports::ChangeDetector) per channel, OR-ed
//! across channels:
//! - [`Adwin`]: adaptive windowing over an exponential histogram
//! - [`PageHinkley`]: cumulative deviation test

pub mod anomaly;
pub mod drift;
pub mod error;

pub use anomaly::{AnomalyConfig, AnomalyDetector, evaluate_channel};
pub use drift::{Adwin, DriftAlgorithm, DriftConfig, DriftEnsemble, DriftSignal, PageHinkley};
pub use error::{AnomalyError, DriftError};
