//! Page-Hinkley test
//!
//! Tracks the cumulative deviation of each value from the running mean, in
//! both directions. A change is signalled when either cumulative sum moves
//! more than `threshold` away from its extreme; the detector then restarts.

use argus_ports::ChangeDetector;

#[derive(Debug, Clone)]
pub struct PageHinkley {
    /// Minimum number of values before a change may be signalled
    min_instances: u64,
    /// Magnitude of change tolerated without accumulating
    delta: f64,
    threshold: f64,
    /// Forgetting factor applied to the cumulative sums
    alpha: f64,

    mean: f64,
    seen: u64,
    sum_up: f64,
    min_up: f64,
    sum_down: f64,
    max_down: f64,
    observations: u64,
}

impl PageHinkley {
    pub fn new(min_instances: u64, delta: f64, threshold: f64, alpha: f64) -> Self {
        Self {
            min_instances,
            delta,
            threshold,
            alpha,
            mean: 0.0,
            seen: 0,
            sum_up: 0.0,
            min_up: 0.0,
            sum_down: 0.0,
            max_down: 0.0,
            observations: 0,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    fn restart(&mut self) {
        self.mean = 0.0;
        self.seen = 0;
        self.sum_up = 0.0;
        self.min_up = 0.0;
        self.sum_down = 0.0;
        self.max_down = 0.0;
    }
}

impl Default for PageHinkley {
    fn default() -> Self {
        Self::new(30, 0.005, 50.0, 1.0 - 1e-4)
    }
}

impl ChangeDetector for PageHinkley {
    fn update(&mut self, value: f64) -> bool {
        self.observations += 1;
        self.seen += 1;
        self.mean += (value - self.mean) / self.seen as f64;

        self.sum_up = self.alpha * self.sum_up + (value - self.mean - self.delta);
        self.sum_down = self.alpha * self.sum_down + (value - self.mean + self.delta);
        self.min_up = self.min_up.min(self.sum_up);
        self.max_down = self.max_down.max(self.sum_down);

        if self.seen < self.min_instances {
            return false;
        }
        let increased = self.sum_up - self.min_up > self.threshold;
        let decreased = self.max_down - self.sum_down > self.threshold;
        if increased || decreased {
            self.restart();
            return true;
        }
        false
    }

    fn observations(&self) -> u64 {
        self.observations
    }

    fn reset(&mut self) {
        self.restart();
        self.observations = 0;
    }

    fn name(&self) -> &str {
        "page_hinkley"
    }
}
