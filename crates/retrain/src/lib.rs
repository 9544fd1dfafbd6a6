//! Argus Retrain - Drift-Triggered Model Replacement
//!
//! ```text
//!        Idle ──request(idx)──► Retraining ──job settles──► Idle
//!         ▲                         │
//!         │      request(idx) ──────┘ AlreadyInProgress (dropped, not queued)
//!         │
//!  slow job: fresh scaler.fit_once(last D points)
//!            walk_forward(P, F) ─► K candidates ─► min composite score
//!            score < active? ─► persist ─► ArcSwap promote
//! ```
//!
//! At most one retrain runs at a time. The guard is an RAII value moved
//! into the job, so it is released on every exit path, panics included.
//! Whatever happens, the active model is either untouched or replaced in
//! one atomic store.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod selection;

pub use config::RetrainConfig;
pub use coordinator::{RetrainAdmission, RetrainCoordinator, RetrainDecision, run_retrain};
pub use error::RetrainError;
pub use selection::select_candidate;
