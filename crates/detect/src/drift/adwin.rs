//! ADWIN (ADaptive WINdowing)
//!
//! Keeps a variable-length window of recent values compressed into an
//! exponential histogram: row `i` holds buckets summarising `2^i` values
//! each, at most `max_buckets` per row. Memory is therefore
//! `O(max_buckets * log W)` for a window of `W` values.
//!
//! Every `clock` updates (once more than `grace_period` values are held) the
//! window is split at each bucket boundary into an older part `W0` and a
//! newer part `W1`. When the means differ by more than
//!
//! ```text
//!  eps = sqrt(2 * m * var * d) + 2/3 * d * m
//!  m   = 1/(n0 - min_len + 1) + 1/(n1 - min_len + 1)
//!  d   = ln(2 * ln(W) / delta)
//! ```
//!
//! the oldest bucket is dropped and a change is signalled.

use argus_ports::ChangeDetector;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    total: f64,
    /// Sum of squared deviations from the bucket mean
    variance: f64,
}

#[derive(Debug, Clone)]
pub struct Adwin {
    delta: f64,
    grace_period: u64,
    clock: u64,
    min_window_length: u64,
    max_buckets: usize,

    /// Row `i` holds buckets of `2^i` values, oldest at the front
    rows: Vec<VecDeque<Bucket>>,
    width: u64,
    total: f64,
    variance: f64,
    ticks: u64,
    observations: u64,
    detections: u64,
}

impl Adwin {
    pub fn new(
        delta: f64,
        grace_period: u64,
        clock: u64,
        min_window_length: u64,
        max_buckets: usize,
    ) -> Self {
        Self {
            delta,
            grace_period,
            clock: clock.max(1),
            min_window_length: min_window_length.max(1),
            max_buckets: max_buckets.max(2),
            rows: vec![VecDeque::new()],
            width: 0,
            total: 0.0,
            variance: 0.0,
            ticks: 0,
            observations: 0,
            detections: 0,
        }
    }

    /// Number of values currently summarised
    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn mean(&self) -> f64 {
        if self.width == 0 {
            0.0
        } else {
            self.total / self.width as f64
        }
    }

    /// Population variance of the current window
    pub fn variance(&self) -> f64 {
        if self.width == 0 {
            0.0
        } else {
            self.variance / self.width as f64
        }
    }

    pub fn detections(&self) -> u64 {
        self.detections
    }

    pub fn bucket_count(&self) -> usize {
        self.rows.iter().map(VecDeque::len).sum()
    }

    fn insert(&mut self, value: f64) {
        self.width += 1;
        if self.width > 1 {
            let n = self.width as f64;
            let prior_mean = self.total / (n - 1.0);
            self.variance += (n - 1.0) * (value - prior_mean).powi(2) / n;
        }
        self.total += value;

        self.rows[0].push_back(Bucket {
            total: value,
            variance: 0.0,
        });
        self.compress();
    }

    fn compress(&mut self) {
        let mut row = 0;
        while row < self.rows.len() {
            if self.rows[row].len() <= self.max_buckets {
                break;
            }
            let (Some(older), Some(newer)) = (self.rows[row].pop_front(), self.rows[row].pop_front())
            else {
                break;
            };
            let size = bucket_size(row);
            let mean_diff = older.total / size - newer.total / size;
            let merged = Bucket {
                total: older.total + newer.total,
                variance: older.variance + newer.variance + size * mean_diff.powi(2) / 2.0,
            };

            if row + 1 == self.rows.len() {
                self.rows.push(VecDeque::new());
            }
            self.rows[row + 1].push_back(merged);
            row += 1;
        }
    }

    fn drop_oldest_bucket(&mut self) {
        let Some(row) = self.rows.iter().rposition(|r| !r.is_empty()) else {
            return;
        };
        let Some(bucket) = self.rows[row].pop_front() else {
            return;
        };
        let size = 1u64 << row;

        self.width -= size.min(self.width);
        self.total -= bucket.total;
        if self.width == 0 {
            self.total = 0.0;
            self.variance = 0.0;
        } else {
            let n1 = size as f64;
            let w = self.width as f64;
            let diff = bucket.total / n1 - self.total / w;
            self.variance -= bucket.variance + n1 * w * diff.powi(2) / (n1 + w);
            self.variance = self.variance.max(0.0);
        }

        while self.rows.len() > 1 && self.rows.last().is_some_and(VecDeque::is_empty) {
            self.rows.pop();
        }
    }

    fn cut_expression(&self, n0: f64, n1: f64, total0: f64, total1: f64) -> bool {
        let mean_diff = (total0 / n0 - total1 / n1).abs();
        let w = self.width as f64;
        let var = self.variance / w;
        let min_len = self.min_window_length as f64;
        let m_recip = 1.0 / (n0 - min_len + 1.0) + 1.0 / (n1 - min_len + 1.0);
        let d = (2.0 * w.ln() / self.delta).ln();
        let epsilon = (2.0 * m_recip * var * d).sqrt() + 2.0 / 3.0 * d * m_recip;
        mean_diff > epsilon
    }

    fn detect_change(&mut self) -> bool {
        let mut detected = false;
        loop {
            let mut cut = false;
            let min_len = self.min_window_length;
            let mut n0 = 0u64;
            let mut n1 = self.width;
            let mut total0 = 0.0;
            let mut total1 = self.total;

            // Oldest buckets first: highest row, front of each row
            'scan: for row in (0..self.rows.len()).rev() {
                let size = 1u64 << row;
                for bucket in &self.rows[row] {
                    n0 += size;
                    n1 -= size.min(n1);
                    total0 += bucket.total;
                    total1 -= bucket.total;

                    if n1 < min_len {
                        break 'scan;
                    }
                    if n0 >= min_len
                        && self.cut_expression(n0 as f64, n1 as f64, total0, total1)
                    {
                        cut = true;
                        break 'scan;
                    }
                }
            }

            if !cut || self.width <= min_len {
                break;
            }
            detected = true;
            self.drop_oldest_bucket();
        }
        detected
    }
}

fn bucket_size(row: usize) -> f64 {
    (1u64 << row) as f64
}

impl Default for Adwin {
    fn default() -> Self {
        Self::new(1e-5, 50, 32, 5, 5)
    }
}

impl ChangeDetector for Adwin {
    fn update(&mut self, value: f64) -> bool {
        self.observations += 1;
        self.insert(value);
        self.ticks += 1;

        if self.ticks % self.clock != 0 || self.width <= self.grace_period {
            return false;
        }
        let detected = self.detect_change();
        if detected {
            self.detections += 1;
        }
        detected
    }

    fn observations(&self) -> u64 {
        self.observations
    }

    fn reset(&mut self) {
        *self = Self::new(
            self.delta,
            self.grace_period,
            self.clock,
            self.min_window_length,
            self.max_buckets,
        );
    }

    fn name(&self) -> &str {
        "adwin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stable(i: usize) -> f64 {
        10.0 + (i % 7) as f64 * 0.1
    }

    #[test]
    fn test_tracks_mean_and_variance() {
        let mut adwin = Adwin::new(1e-5, 1000, 1000, 5, 5);
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        for v in values {
            adwin.update(v);
        }
        assert_eq!(adwin.width(), 8);
        assert_relative_eq!(adwin.mean(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(adwin.variance(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stable_stream_never_signals() {
        let mut adwin = Adwin::default();
        let signals = (0..3000).filter(|&i| adwin.update(stable(i))).count();
        assert_eq!(signals, 0);
        assert_eq!(adwin.width(), 3000);
    }

    #[test]
    fn test_level_shift_is_detected() {
        let mut adwin = Adwin::default();
        for i in 0..1000 {
            assert!(!adwin.update(stable(i)));
        }

        let detected_at = (0..500).find(|&i| adwin.update(stable(i) + 5.0));
        assert!(detected_at.is_some(), "shift never detected");
        assert!(adwin.detections() >= 1);

        for i in 0..500 {
            adwin.update(stable(i) + 5.0);
        }
        // The old regime has been cut away
        assert!(adwin.width() < 1500);
        assert!(adwin.mean() > 12.0);
    }

    #[test]
    fn test_grace_period_suppresses_early_signals() {
        let mut adwin = Adwin::new(1e-5, 50, 1, 5, 5);
        for i in 0..25 {
            assert!(!adwin.update(if i < 12 { 0.0 } else { 100.0 }));
        }
    }

    #[test]
    fn test_memory_stays_logarithmic() {
        let mut adwin = Adwin::default();
        for i in 0..10_000 {
            adwin.update(stable(i));
        }
        let rows = (adwin.width() as f64).log2().ceil() as usize + 1;
        assert!(adwin.bucket_count() <= 5 * rows);
    }

    #[test]
    fn test_reset_forgets_window() {
        let mut adwin = Adwin::default();
        for i in 0..100 {
            adwin.update(stable(i));
        }
        adwin.reset();
        assert_eq!(adwin.width(), 0);
        assert_eq!(adwin.observations(), 0);
        assert_eq!(adwin.bucket_count(), 0);
    }
}
