//! Run configuration for baseline and Monte Carlo estimation.

use crate::constants::{DEFAULT_COST_PER_STEP, DEFAULT_EPISODES, DEFAULT_LEARNING_RATE};
use crate::error::ConfigError;
use crate::traversal::WalkLimits;
use serde::{Deserialize, Serialize};

/// Parameters shared by the baseline batch and the Monte Carlo estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of walks for the baseline batch and for the estimator.
    #[serde(default = "SimulationConfig::default_episodes")]
    pub episodes: usize,
    /// Constant step size of the running-average update.
    #[serde(default = "SimulationConfig::default_learning_rate")]
    pub learning_rate: f64,
    /// Penalty charged per transition.
    #[serde(default = "SimulationConfig::default_cost_per_step")]
    pub cost_per_step: f64,
    /// Seed for the RNG streams; drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Optional bound after which a walk fails with a "did not terminate" error.
    #[serde(default)]
    pub max_steps: Option<u64>,
}

impl SimulationConfig {
    const fn default_episodes() -> usize {
        DEFAULT_EPISODES
    }

    const fn default_learning_rate() -> f64 {
        DEFAULT_LEARNING_RATE
    }

    const fn default_cost_per_step() -> f64 {
        DEFAULT_COST_PER_STEP
    }

    /// Load a configuration from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.episodes == 0 {
            return Err(ConfigError::NoEpisodes);
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::LearningRate {
                value: self.learning_rate,
            });
        }
        if !self.cost_per_step.is_finite() || self.cost_per_step > 0.0 {
            return Err(ConfigError::CostPerStep {
                value: self.cost_per_step,
            });
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::ZeroStepBound);
        }
        Ok(())
    }

    #[must_use]
    pub const fn limits(&self) -> WalkLimits {
        WalkLimits {
            cost_per_step: self.cost_per_step,
            max_steps: self.max_steps,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            episodes: Self::default_episodes(),
            learning_rate: Self::default_learning_rate(),
            cost_per_step: Self::default_cost_per_step(),
            seed: None,
            max_steps: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.episodes, 10_000);
        assert!((cfg.learning_rate - 0.1).abs() < f64::EPSILON);
        assert!((cfg.cost_per_step + 1.0).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SimulationConfig::from_json(r#"{ "episodes": 250, "seed": 42 }"#).unwrap();
        assert_eq!(cfg.episodes, 250);
        assert_eq!(cfg.seed, Some(42));
        assert!((cfg.learning_rate - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.max_steps, None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_rate = SimulationConfig {
            learning_rate: 0.0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            bad_rate.validate(),
            Err(ConfigError::LearningRate { value: 0.0 })
        );

        let bad_cost = SimulationConfig {
            cost_per_step: 2.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            bad_cost.validate(),
            Err(ConfigError::CostPerStep { .. })
        ));

        let no_episodes = SimulationConfig {
            episodes: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(no_episodes.validate(), Err(ConfigError::NoEpisodes));

        let zero_bound = SimulationConfig {
            max_steps: Some(0),
            ..SimulationConfig::default()
        };
        assert_eq!(zero_bound.validate(), Err(ConfigError::ZeroStepBound));
    }

    #[test]
    fn nan_learning_rate_is_rejected() {
        let cfg = SimulationConfig {
            learning_rate: f64::NAN,
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn limits_carry_cost_and_bound() {
        let cfg = SimulationConfig {
            cost_per_step: -2.5,
            max_steps: Some(64),
            ..SimulationConfig::default()
        };
        let limits = cfg.limits();
        assert!((limits.cost_per_step + 2.5).abs() < f64::EPSILON);
        assert_eq!(limits.max_steps, Some(64));
    }
}
