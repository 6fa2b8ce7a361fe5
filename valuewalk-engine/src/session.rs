//! A configured simulation run over one graph: baseline batch, Monte Carlo
//! batch and the resulting report.

use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::estimator::{
    BaselineEstimate, MonteCarloEstimator, MonteCarloSummary, ValueTable, estimate_baseline,
};
use crate::graph::{Graph, StateId};
use crate::rng::{RngBundle, RngDraws};
use serde::{Deserialize, Serialize};

/// Learned value of a single state, as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    pub name: String,
    pub terminal: bool,
    pub payoff: f64,
    pub value: f64,
    pub visits: u64,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub scenario: String,
    pub start: String,
    /// Seed that replays this run.
    pub seed: u64,
    pub config: SimulationConfig,
    pub baseline: BaselineEstimate,
    pub monte_carlo: MonteCarloSummary,
    /// One row per state in creation order.
    pub states: Vec<StateReport>,
    pub draws: RngDraws,
}

impl SimulationReport {
    pub fn terminal_states(&self) -> impl Iterator<Item = &StateReport> {
        self.states.iter().filter(|state| state.terminal)
    }

    pub fn decision_states(&self) -> impl Iterator<Item = &StateReport> {
        self.states.iter().filter(|state| !state.terminal)
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<&StateReport> {
        self.states.iter().find(|state| state.name == name)
    }
}

/// Owns the graph, the RNG streams and the learned values of one run.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    name: String,
    graph: Graph,
    start: StateId,
    config: SimulationConfig,
    rng: RngBundle,
    estimator: MonteCarloEstimator,
}

impl SimulationSession {
    /// Create a session, seeding the RNG streams from `config.seed` or entropy.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or `start` is not in `graph`.
    pub fn new(
        name: impl Into<String>,
        graph: Graph,
        start: StateId,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        if graph.state(start).is_none() {
            return Err(SimulationError::UnknownStateId {
                index: start.index(),
            });
        }
        let rng = config
            .seed
            .map_or_else(RngBundle::from_entropy, RngBundle::from_user_seed);
        let estimator = MonteCarloEstimator::new(&graph, &config)?;
        let name = name.into();
        log::debug!(
            "session '{name}': {} states, seed {}, {} episodes",
            graph.len(),
            rng.seed(),
            config.episodes
        );
        Ok(Self {
            name,
            graph,
            start,
            config,
            rng,
            estimator,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub const fn start(&self) -> StateId {
        self.start
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn values(&self) -> &ValueTable {
        self.estimator.values()
    }

    /// Average `config.episodes` baseline walks on the baseline stream.
    ///
    /// # Errors
    ///
    /// Propagates the first failing walk.
    pub fn run_baseline_batch(&mut self) -> Result<BaselineEstimate, SimulationError> {
        estimate_baseline(&self.graph, self.start, &self.config, self.rng.baseline())
    }

    /// Run `config.episodes` Monte Carlo episodes, continuing from the
    /// values learned so far.
    ///
    /// # Errors
    ///
    /// Propagates the first failing episode; values learned before it are kept.
    pub fn run_monte_carlo(&mut self) -> Result<MonteCarloSummary, SimulationError> {
        self.estimator
            .run(&self.graph, self.start, self.rng.episodes())
    }

    /// Baseline batch, then Monte Carlo batch, then the report.
    ///
    /// # Errors
    ///
    /// Propagates the first failing walk.
    pub fn run(&mut self) -> Result<SimulationReport, SimulationError> {
        let baseline = self.run_baseline_batch()?;
        let monte_carlo = self.run_monte_carlo()?;
        Ok(self.report(baseline, monte_carlo))
    }

    /// Per-state rows in creation order.
    #[must_use]
    pub fn state_reports(&self) -> Vec<StateReport> {
        let values = self.estimator.values();
        self.graph
            .states()
            .map(|(id, state)| StateReport {
                name: state.name.clone(),
                terminal: state.is_terminal(),
                payoff: state.payoff(),
                value: values.value(id),
                visits: values.visits(id),
            })
            .collect()
    }

    fn report(
        &self,
        baseline: BaselineEstimate,
        monte_carlo: MonteCarloSummary,
    ) -> SimulationReport {
        let start = self
            .graph
            .state(self.start)
            .map(|state| state.name.clone())
            .unwrap_or_default();
        SimulationReport {
            scenario: self.name.clone(),
            start,
            seed: self.rng.seed(),
            config: self.config.clone(),
            baseline,
            monte_carlo,
            states: self.state_reports(),
            draws: self.rng.draws(),
        }
    }
}
