//! Argus Runner - Pipeline Session
//!
//! Wires the components into one [`Pipeline`] and drives it:
//!
//! - **Config**: JSON file with per-component sections
//! - **Source**: CSV or in-memory measurements
//! - **Pipeline**: `tick`, `full_state`, `poll_fresh`, startup and shutdown
//! - **Driver**: ticks on a fixed interval until end of data
//! - **HTTP**: JSON endpoints over the pipeline
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────┐        ┌──────────────┐
//!   │  TickDriver  │        │  HTTP (axum) │
//!   └──────┬───────┘        └──────┬───────┘
//!          │ tick()                │ tick() / full_state() / poll_fresh()
//!          ▼                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         PIPELINE                            │
//! │                                                             │
//! │  MeasurementSource ──► WindowedStore ◄── completions        │
//! │                            │    ▲                           │
//! │           DriftEnsemble ◄──┤    │                           │
//! │                │           │    │                           │
//! │                ▼           ▼    │                           │
//! │     RetrainCoordinator   ForecastOrchestrator               │
//! │        (slow pool)       AnomalyDetector (fast pool)        │
//! │                │                ▲                           │
//! │                └──► ActiveModelCell (ArcSwap)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod source;

// Re-export main types
pub use config::{ArgusConfig, ConfigError, load_config, load_config_from_str, load_default_config};
pub use driver::{DriverStop, TickDriver};
pub use error::PipelineError;
pub use pipeline::{Pipeline, TickReport};
pub use source::{CsvMeasurementSource, VecSource};
