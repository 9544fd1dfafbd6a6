use crate::error::RetrainError;
use argus_ports::{CandidateConfig, WindowSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for drift-triggered retraining
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrainConfig {
    /// Most recent points used to build the training set (D)
    pub data_gathering_period: usize,
    /// Past window of each training pair (P)
    pub past_window: usize,
    /// Label length of each training pair (F)
    pub horizon: usize,
    /// Trailing share of pairs held out for scoring
    pub validation_fraction: f64,
    /// Where accepted models are written
    pub artifact_dir: PathBuf,
    /// One candidate is trained per entry
    pub candidates: Vec<CandidateConfig>,
}

impl Default for RetrainConfig {
    fn default() -> Self {
        Self {
            data_gathering_period: 200,
            past_window: 48,
            horizon: 1,
            validation_fraction: 0.15,
            artifact_dir: PathBuf::from("models"),
            candidates: vec![CandidateConfig::new(20, 0.01), CandidateConfig::new(40, 0.005)],
        }
    }
}

impl RetrainConfig {
    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec {
            past: self.past_window,
            horizon: self.horizon,
            validation_fraction: self.validation_fraction,
        }
    }

    /// Points needed for a single training pair
    pub fn min_points(&self) -> usize {
        self.window_spec().min_points()
    }

    pub fn validate(&self) -> Result<(), RetrainError> {
        if self.past_window == 0 || self.horizon == 0 {
            return Err(RetrainError::InvalidConfig(
                "past_window and horizon must be positive".to_string(),
            ));
        }
        if self.min_points() > self.data_gathering_period {
            return Err(RetrainError::InvalidConfig(format!(
                "past_window + horizon ({}) exceeds data_gathering_period ({})",
                self.min_points(),
                self.data_gathering_period
            )));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(RetrainError::InvalidConfig(format!(
                "validation_fraction must be in [0, 1), got {}",
                self.validation_fraction
            )));
        }
        if self.candidates.is_empty() {
            return Err(RetrainError::InvalidConfig(
                "at least one candidate is required".to_string(),
            ));
        }
        if let Some(bad) = self
            .candidates
            .iter()
            .find(|c| c.epochs == 0 || !(c.learning_rate > 0.0))
        {
            return Err(RetrainError::InvalidConfig(format!("invalid candidate ({bad})")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RetrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_points(), 49);
    }

    #[test]
    fn test_past_window_bounded_by_gathering_period() {
        let config = RetrainConfig {
            data_gathering_period: 40,
            ..RetrainConfig::default()
        };
        assert!(matches!(config.validate(), Err(RetrainError::InvalidConfig(_))));
    }

    #[test]
    fn test_gathering_period_must_hold_one_pair() {
        let short = RetrainConfig {
            data_gathering_period: 48,
            ..RetrainConfig::default()
        };
        assert_eq!(short.min_points(), 49);
        assert!(matches!(short.validate(), Err(RetrainError::InvalidConfig(_))));

        let exact = RetrainConfig {
            data_gathering_period: 49,
            ..RetrainConfig::default()
        };
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn test_candidates_required() {
        let config = RetrainConfig {
            candidates: Vec::new(),
            ..RetrainConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RetrainConfig {
            candidates: vec![CandidateConfig::new(0, 0.1)],
            ..RetrainConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let config: RetrainConfig = serde_json::from_str(
            r#"{
                "data_gathering_period": 300,
                "candidates": [{"epochs": 5, "learning_rate": 0.1}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.data_gathering_period, 300);
        assert_eq!(config.past_window, 48);
        assert_eq!(config.candidates, vec![CandidateConfig::new(5, 0.1)]);
    }
}
