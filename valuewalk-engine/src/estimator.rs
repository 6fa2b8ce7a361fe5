//! Batch estimators: the averaged baseline walk and every-visit Monte Carlo.
//!
//! The Monte Carlo update credits every state an episode passed through with
//! that episode's full return:
//!
//! ```text
//! value <- value + learning_rate * (episode_payoff - value)
//! ```
//!
//! There is no discounting and no convergence check; the estimator runs a
//! fixed number of episodes.

use crate::config::SimulationConfig;
use crate::constants::INITIAL_STATE_VALUE;
use crate::error::{ConfigError, SimulationError};
use crate::graph::{Graph, StateId};
use crate::numbers::{count_to_f64, usize_to_f64};
use crate::traversal::{EpisodeOutcome, WalkLimits, run_baseline, run_episode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Learned value and visit count per state, indexed by [`StateId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    values: Vec<f64>,
    visits: Vec<u64>,
}

impl ValueTable {
    /// Table with every value at its initial estimate of 0.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![INITIAL_STATE_VALUE; len],
            visits: vec![0; len],
        }
    }

    #[must_use]
    pub fn for_graph(graph: &Graph) -> Self {
        Self::new(graph.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn value(&self, id: StateId) -> f64 {
        self.values
            .get(id.index())
            .copied()
            .unwrap_or(INITIAL_STATE_VALUE)
    }

    /// Number of episodes that passed through the state.
    #[must_use]
    pub fn visits(&self, id: StateId) -> u64 {
        self.visits.get(id.index()).copied().unwrap_or(0)
    }

    /// Move every visited state's value toward `episode_payoff`.
    ///
    /// Each state in `visited` is updated once, however often the episode
    /// entered it.
    pub fn update(&mut self, visited: &BTreeSet<StateId>, episode_payoff: f64, learning_rate: f64) {
        for id in visited {
            let idx = id.index();
            if let (Some(value), Some(visits)) = (self.values.get_mut(idx), self.visits.get_mut(idx))
            {
                *value += learning_rate * (episode_payoff - *value);
                *visits = visits.saturating_add(1);
            }
        }
    }
}

/// Running min / max / mean over a stream of payoffs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct PayoffStats {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
    steps: u64,
}

impl PayoffStats {
    fn record(&mut self, payoff: f64, steps: u64) {
        if self.count == 0 {
            self.min = payoff;
            self.max = payoff;
        } else {
            self.min = self.min.min(payoff);
            self.max = self.max.max(payoff);
        }
        self.count += 1;
        self.sum += payoff;
        self.steps = self.steps.saturating_add(steps);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / usize_to_f64(self.count)
        }
    }

    fn mean_steps(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            count_to_f64(self.steps) / usize_to_f64(self.count)
        }
    }
}

/// Averaged outcome of repeated baseline walks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineEstimate {
    pub runs: usize,
    /// Expected payoff: total payoff over all runs divided by `runs`.
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub mean_steps: f64,
}

/// Run the baseline walk `config.episodes` times and average the payoffs.
///
/// # Errors
///
/// Fails on an invalid configuration or when any walk fails.
pub fn estimate_baseline<R: Rng + ?Sized>(
    graph: &Graph,
    start: StateId,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<BaselineEstimate, SimulationError> {
    config.validate()?;
    let limits = config.limits();
    let mut stats = PayoffStats::default();
    for _ in 0..config.episodes {
        let outcome = run_baseline(graph, start, limits, rng)?;
        stats.record(outcome.payoff, outcome.steps);
    }
    log::debug!(
        "baseline: {} runs, mean payoff {:.4}",
        stats.count,
        stats.mean()
    );
    Ok(BaselineEstimate {
        runs: stats.count,
        mean: stats.mean(),
        min: stats.min,
        max: stats.max,
        mean_steps: stats.mean_steps(),
    })
}

/// Aggregate statistics of a Monte Carlo batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub episodes: usize,
    pub mean_payoff: f64,
    pub min_payoff: f64,
    pub max_payoff: f64,
    pub total_steps: u64,
}

/// Every-visit, constant-step-size Monte Carlo value estimator.
#[derive(Debug, Clone)]
pub struct MonteCarloEstimator {
    episodes: usize,
    learning_rate: f64,
    limits: WalkLimits,
    values: ValueTable,
}

impl MonteCarloEstimator {
    /// Estimator with a zeroed value table sized for `graph`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(graph: &Graph, config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::with_values(ValueTable::for_graph(graph), config)
    }

    /// Estimator that continues from previously learned values.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_values(values: ValueTable, config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            episodes: config.episodes,
            learning_rate: config.learning_rate,
            limits: config.limits(),
            values,
        })
    }

    /// Fold one episode into the value table.
    pub fn observe(&mut self, outcome: &EpisodeOutcome) {
        self.values
            .update(&outcome.visited, outcome.payoff, self.learning_rate);
    }

    /// Run the configured number of episodes from `start`, updating after each.
    ///
    /// # Errors
    ///
    /// Stops at the first episode that fails.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        graph: &Graph,
        start: StateId,
        rng: &mut R,
    ) -> Result<MonteCarloSummary, SimulationError> {
        let mut stats = PayoffStats::default();
        for episode in 0..self.episodes {
            let outcome = run_episode(graph, start, self.limits, rng)?;
            log::trace!(
                "episode {episode}: payoff {:.4}, {} steps, {} states",
                outcome.payoff,
                outcome.steps,
                outcome.visited.len()
            );
            self.observe(&outcome);
            stats.record(outcome.payoff, outcome.steps);
        }
        log::debug!(
            "monte carlo: {} episodes, mean payoff {:.4}, start value {:.4}",
            stats.count,
            stats.mean(),
            self.values.value(start)
        );
        Ok(MonteCarloSummary {
            episodes: stats.count,
            mean_payoff: stats.mean(),
            min_payoff: stats.min,
            max_payoff: stats.max,
            total_steps: stats.steps,
        })
    }

    #[must_use]
    pub const fn values(&self) -> &ValueTable {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> ValueTable {
        self.values
    }
}
