//! Argus Executor - Bounded Worker Pools
//!
//! Fire-and-forget execution of blocking jobs with exactly-once completion:
//!
//! ```text
//!  tick() ──submit──► WorkerPool ──permit──► spawn_blocking(job)
//!     │                                          │
//!     │ (returns immediately)                    ▼ oneshot
//!     └──────────────── JobHandle ──on_complete──► callback(Result<T, TaskError>)
//! ```
//!
//! - **Fast pool**: forecasting and anomaly jobs (3-5 workers)
//! - **Slow pool**: retraining (1 worker by default)
//!
//! The submitting code never waits on a job. A job that panics completes
//! with `TaskError::Panicked`; a callback that panics is logged and
//! swallowed. `on_complete` consumes the handle, so each callback runs
//! exactly once, with either the job's value or the reason it has none.

pub mod error;
pub mod executor;
pub mod pool;
mod tracker;

pub use error::{ExecutorError, TaskError};
pub use executor::{ExecutorConfig, TaskExecutor};
pub use pool::{JobHandle, JobId, WorkerPool};
