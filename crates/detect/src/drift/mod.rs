//! Drift detection
//!
//! One change detector per channel; the ensemble signals drift when any
//! channel does. Every detector sees every value, even after an earlier
//! channel has already signalled on the same tick.

mod adwin;
mod page_hinkley;

pub use adwin::Adwin;
pub use page_hinkley::PageHinkley;

use crate::error::DriftError;
use argus_core::ChannelId;
use argus_ports::ChangeDetector;
use serde::{Deserialize, Serialize};

/// Clock margin added to the data gathering period when none is configured
pub const DEFAULT_CLOCK_MARGIN: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftAlgorithm {
    #[default]
    Adwin,
    PageHinkley,
}

/// Configuration for the per-channel change detectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub algorithm: DriftAlgorithm,
    /// ADWIN false-positive tolerance
    pub delta: f64,
    /// Values seen before a detector may signal
    pub grace_period: u64,
    /// ADWIN checks for a cut every `clock` values (default: 64 + data gathering period)
    pub clock: Option<u64>,
    /// ADWIN minimum length of each sub-window
    pub min_window_length: u64,
    /// ADWIN buckets per histogram row
    pub max_buckets: usize,
    /// Page-Hinkley magnitude of change tolerated without accumulating
    pub magnitude: f64,
    /// Page-Hinkley alarm threshold
    pub threshold: f64,
    /// Page-Hinkley forgetting factor
    pub alpha: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            algorithm: DriftAlgorithm::Adwin,
            delta: 1e-5,
            grace_period: 50,
            clock: None,
            min_window_length: 5,
            max_buckets: 5,
            magnitude: 0.005,
            threshold: 50.0,
            alpha: 1.0 - 1e-4,
        }
    }
}

impl DriftConfig {
    pub fn validate(&self) -> Result<(), DriftError> {
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(DriftError::InvalidConfig(format!(
                "delta must be in (0, 1), got {}",
                self.delta
            )));
        }
        if self.clock == Some(0) {
            return Err(DriftError::InvalidConfig("clock must be positive".into()));
        }
        if self.max_buckets < 2 {
            return Err(DriftError::InvalidConfig(format!(
                "max_buckets must be at least 2, got {}",
                self.max_buckets
            )));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(DriftError::InvalidConfig(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.threshold <= 0.0 {
            return Err(DriftError::InvalidConfig(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    pub fn resolved_clock(&self, data_gathering_period: usize) -> u64 {
        self.clock
            .unwrap_or(DEFAULT_CLOCK_MARGIN + data_gathering_period as u64)
    }

    /// Build one detector
    pub fn build(&self, data_gathering_period: usize) -> Box<dyn ChangeDetector> {
        match self.algorithm {
            DriftAlgorithm::Adwin => Box::new(Adwin::new(
                self.delta,
                self.grace_period,
                self.resolved_clock(data_gathering_period),
                self.min_window_length,
                self.max_buckets,
            )),
            DriftAlgorithm::PageHinkley => Box::new(PageHinkley::new(
                self.grace_period,
                self.magnitude,
                self.threshold,
                self.alpha,
            )),
        }
    }
}

/// Result of one ensemble evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftSignal {
    pub drifted: bool,
    /// Channels whose detector signalled
    pub channels: Vec<ChannelId>,
}

/// Per-channel detectors, OR-ed
#[derive(Debug)]
pub struct DriftEnsemble {
    detectors: Vec<Box<dyn ChangeDetector>>,
}

impl DriftEnsemble {
    pub fn new(detectors: Vec<Box<dyn ChangeDetector>>) -> Self {
        Self { detectors }
    }

    pub fn from_config(
        config: &DriftConfig,
        channels: usize,
        data_gathering_period: usize,
    ) -> Result<Self, DriftError> {
        config.validate()?;
        let detectors = (0..channels)
            .map(|_| config.build(data_gathering_period))
            .collect();
        log::info!(
            "[drift] {} detector per channel ({} channels)",
            match config.algorithm {
                DriftAlgorithm::Adwin => "adwin",
                DriftAlgorithm::PageHinkley => "page_hinkley",
            },
            channels
        );
        Ok(Self::new(detectors))
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Feed one value per channel
    pub fn evaluate(&mut self, values: &[f64]) -> Result<DriftSignal, DriftError> {
        if values.len() != self.detectors.len() {
            return Err(DriftError::WidthMismatch {
                expected: self.detectors.len(),
                actual: values.len(),
            });
        }

        let channels: Vec<ChannelId> = self
            .detectors
            .iter_mut()
            .zip(values)
            .enumerate()
            .filter_map(|(c, (detector, &value))| {
                detector.update(value).then_some(ChannelId::new(c))
            })
            .collect();

        for channel in &channels {
            log::info!(
                "[drift] {} detector signalled on {}",
                self.detectors[channel.index()].name(),
                channel
            );
        }

        Ok(DriftSignal {
            drifted: !channels.is_empty(),
            channels,
        })
    }

    pub fn reset(&mut self) {
        for detector in &mut self.detectors {
            detector.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Signals on every `every`-th value
    #[derive(Debug)]
    struct Periodic {
        every: u64,
        seen: u64,
    }

    impl ChangeDetector for Periodic {
        fn update(&mut self, _value: f64) -> bool {
            self.seen += 1;
            self.seen % self.every == 0
        }
        fn observations(&self) -> u64 {
            self.seen
        }
        fn reset(&mut self) {
            self.seen = 0;
        }
        fn name(&self) -> &str {
            "periodic"
        }
    }

    fn periodic(every: u64) -> Box<dyn ChangeDetector> {
        Box::new(Periodic { every, seen: 0 })
    }

    #[test]
    fn test_or_across_channels() {
        let mut ensemble = DriftEnsemble::new(vec![periodic(2), periodic(3)]);

        assert_eq!(ensemble.evaluate(&[0.0, 0.0]).unwrap(), DriftSignal::default());

        let signal = ensemble.evaluate(&[0.0, 0.0]).unwrap();
        assert!(signal.drifted);
        assert_eq!(signal.channels, vec![ChannelId::new(0)]);

        let signal = ensemble.evaluate(&[0.0, 0.0]).unwrap();
        assert_eq!(signal.channels, vec![ChannelId::new(1)]);
    }

    #[test]
    fn test_every_detector_is_updated() {
        let mut ensemble = DriftEnsemble::new(vec![periodic(1), periodic(100)]);
        for _ in 0..10 {
            ensemble.evaluate(&[1.0, 1.0]).unwrap();
        }
        assert!(ensemble.detectors.iter().all(|d| d.observations() == 10));
    }

    #[test]
    fn test_width_mismatch() {
        let mut ensemble = DriftEnsemble::new(vec![periodic(1)]);
        assert_eq!(
            ensemble.evaluate(&[1.0, 2.0]),
            Err(DriftError::WidthMismatch {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(ensemble.detectors[0].observations(), 0);
    }

    #[test]
    fn test_default_clock_follows_gathering_period() {
        let config = DriftConfig::default();
        assert_eq!(config.resolved_clock(200), 264);

        let config = DriftConfig {
            clock: Some(10),
            ..DriftConfig::default()
        };
        assert_eq!(config.resolved_clock(200), 10);
    }

    #[test]
    fn test_config_from_json() {
        let config: DriftConfig =
            serde_json::from_str(r#"{"algorithm": "page_hinkley", "threshold": 20.0}"#).unwrap();
        assert_eq!(config.algorithm, DriftAlgorithm::PageHinkley);
        assert_eq!(config.threshold, 20.0);
        assert_eq!(config.grace_period, 50);

        let ensemble = DriftEnsemble::from_config(&config, 3, 200).unwrap();
        assert_eq!(ensemble.len(), 3);
        assert_eq!(ensemble.detectors[0].name(), "page_hinkley");
    }

    #[test]
    fn test_invalid_delta_rejected() {
        let config = DriftConfig {
            delta: 0.0,
            ..DriftConfig::default()
        };
        assert!(matches!(config.validate(), Err(DriftError::InvalidConfig(_))));
    }

    #[test]
    fn test_adwin_ensemble_flags_shifted_channel() {
        let config = DriftConfig {
            clock: Some(16),
            ..DriftConfig::default()
        };
        let mut ensemble = DriftEnsemble::from_config(&config, 2, 0).unwrap();
        for i in 0..600 {
            let v = 10.0 + (i % 4) as f64 * 0.1;
            assert!(!ensemble.evaluate(&[v, v]).unwrap().drifted);
        }

        let mut flagged = Vec::new();
        for i in 0..300 {
            let v = 10.0 + (i % 4) as f64 * 0.1;
            let signal = ensemble.evaluate(&[v, v + 8.0]).unwrap();
            flagged.extend(signal.channels);
        }
        assert!(flagged.contains(&ChannelId::new(1)));
        assert!(!flagged.contains(&ChannelId::new(0)));
    }
}
