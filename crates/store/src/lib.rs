//! Argus Store - Windowed Series State
//!
//! Owns the append-only, index-aligned series of every channel:
//!
//! ```text
//!  index:        0     1     2    ...   n-1  |  n
//!  real:         r0    r1    r2   ...   rn-1 |
//!  predicted:    ·     p1    p2   ...   pn-1 |  pn   <- reserved for the next tick
//!  anomaly:      ·     ·     a2   ...   ·    |  ·
//!  retrain:      ·     ·     ·    ...   m    |  ·
//! ```
//!
//! `advance` appends one real value per channel and reserves one empty slot
//! in each derived array. Asynchronous completions only ever fill reserved
//! slots, so out-of-order completion can never change array lengths.
//!
//! Every mutation goes through one lock ([`SharedStore`]); the store itself
//! is a plain struct and is fully testable without a runtime.

pub mod error;
pub mod series;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use series::SensorSeries;
pub use store::{SharedStore, WindowedStore};
