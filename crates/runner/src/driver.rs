//! Periodic tick driver

use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Why the driver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStop {
    /// The source ran out of measurements
    EndOfData { ticks: u64 },
    /// The configured tick budget was used up
    MaxTicks { ticks: u64 },
    /// Shutdown was requested
    Shutdown { ticks: u64 },
}

/// Calls `Pipeline::tick` on a fixed interval
pub struct TickDriver {
    pipeline: Arc<Pipeline>,
    interval: Duration,
    max_ticks: Option<u64>,
}

impl TickDriver {
    pub fn new(pipeline: Arc<Pipeline>, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            max_ticks: None,
        }
    }

    /// Stop after `max_ticks` driven ticks
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Run until end of data, the tick budget, or `shutdown` turns true
    ///
    /// Source and store errors other than end of data stop the driver and
    /// are returned.
    pub async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<DriverStop, PipelineError> {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick of a tokio interval completes immediately
        interval.tick().await;

        let mut ticks = 0u64;
        log::info!("[driver] ticking every {:?}", self.interval);

        loop {
            if *shutdown.borrow() {
                return Ok(DriverStop::Shutdown { ticks });
            }
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                log::info!("[driver] tick budget of {} reached", ticks);
                return Ok(DriverStop::MaxTicks { ticks });
            }

            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("[driver] shutdown requested after {} ticks", ticks);
                        return Ok(DriverStop::Shutdown { ticks });
                    }
                    continue;
                }
            }

            match self.pipeline.tick() {
                Ok(report) => {
                    ticks += 1;
                    log::debug!("[driver] {:?}", report);
                }
                Err(e) if e.is_end_of_data() => {
                    log::info!("[driver] end of data after {} ticks", ticks);
                    return Ok(DriverStop::EndOfData { ticks });
                }
                Err(e) => {
                    log::error!("[driver] tick failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}
