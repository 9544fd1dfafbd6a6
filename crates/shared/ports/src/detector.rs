use std::fmt;

/// Port for online change detection on a single stream
///
/// Implementations must keep bounded state (no full-history retention),
/// expose a false-positive tolerance and a minimum observation count in
/// their configuration, and never require the whole history to signal.
pub trait ChangeDetector: Send + fmt::Debug {
    /// Feed one value; returns true when a change is signalled on this update
    fn update(&mut self, value: f64) -> bool;

    /// Number of values seen since construction or the last reset
    fn observations(&self) -> u64;

    /// Forget everything learnt so far
    fn reset(&mut self);

    /// Algorithm name for logging
    fn name(&self) -> &str;
}
