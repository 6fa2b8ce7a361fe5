//! Valuewalk Engine
//!
//! Estimates the expected cumulative payoff of a stochastic decision process
//! modeled as a weighted directed graph of states. Two procedures are
//! provided: a greedy-leaning baseline walk and an every-visit Monte Carlo
//! estimator that learns a running-average value per state.

pub mod config;
pub mod constants;
pub mod error;
pub mod estimator;
pub mod graph;
pub mod numbers;
pub mod rng;
pub mod scenario;
pub mod session;
pub mod traversal;

use anyhow::Context;

// Re-export commonly used types
pub use config::SimulationConfig;
pub use constants::VALUE_DISPLAY_DIGITS;
pub use error::{ConfigError, GraphError, SimulationError};
pub use estimator::{
    BaselineEstimate, MonteCarloEstimator, MonteCarloSummary, ValueTable, estimate_baseline,
};
pub use graph::{Choice, Graph, GraphBuilder, Node, SelectionRule, State, StateId};
pub use numbers::format_significant;
pub use rng::{RngBundle, RngDraws};
pub use scenario::{ChoiceSpec, ScenarioSpec, StateSpec};
pub use session::{SimulationReport, SimulationSession, StateReport};
pub use traversal::{
    EpisodeOutcome, WalkLimits, WalkOutcome, choose_weighted, run_baseline, run_episode,
};

/// Trait for abstracting where scenarios come from.
/// Front ends provide implementations (built-in catalogs, files, ...).
pub trait GraphLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the scenario description.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be loaded.
    fn load_scenario(&self) -> Result<ScenarioSpec, Self::Error>;
}

/// Entry point tying a scenario source to simulation sessions.
pub struct SimulationEngine<L>
where
    L: GraphLoader,
{
    loader: L,
}

impl<L> SimulationEngine<L>
where
    L: GraphLoader,
{
    /// Create a new engine with the provided scenario loader
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load, validate and build the scenario graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be loaded or is malformed.
    pub fn load_graph(&self) -> Result<(ScenarioSpec, Graph, StateId), anyhow::Error> {
        let spec = self.loader.load_scenario()?;
        let (graph, start) = spec
            .to_graph()
            .with_context(|| format!("scenario '{}' is malformed", spec.name))?;
        Ok((spec, graph, start))
    }

    /// Construct a session over the loaded scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be loaded, is malformed, or
    /// the configuration is invalid.
    pub fn create_session(
        &self,
        config: SimulationConfig,
    ) -> Result<SimulationSession, anyhow::Error> {
        let (spec, graph, start) = self.load_graph()?;
        SimulationSession::new(spec.name, graph, start, config)
            .context("invalid simulation configuration")
    }
}
