//! Argus Forecast - One-Step-Ahead Prediction
//!
//! ```text
//!  submit(idx) ──window_matrix(48)──► fast job:
//!                                       ActiveModel snapshot (ArcSwap)
//!                                       scaler.transform ─► model.predict ─► inverse_transform
//!                                     ──► predicted[idx + 1] for every channel
//! ```
//!
//! The scaler inside the active model is fitted once, on a historical
//! baseline or restored from an artifact, and is never refit per call.
//!
//! Reference implementations of the model ports live here as well:
//! - [`MinMaxScaler`]: per-channel min-max scaling
//! - [`LinearForecaster`]: per-channel autoregression over the last `lags` values
//! - [`LinearTrainer`]: SGD trainer and JSON artifact writer for it

pub mod active;
pub mod artifact;
pub mod error;
pub mod linear;
pub mod orchestrator;
pub mod scaler;

pub use active::{ActiveModel, ActiveModelCell, ActiveModelSummary};
pub use artifact::{LoadedArtifact, ModelArtifact};
pub use error::ForecastError;
pub use linear::{LinearForecaster, LinearTrainer};
pub use orchestrator::{ForecastConfig, ForecastOrchestrator};
pub use scaler::MinMaxScaler;
