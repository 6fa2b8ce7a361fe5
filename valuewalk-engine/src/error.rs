//! Error types raised while building graphs and running simulations.

use thiserror::Error;

/// Errors raised when a decision graph violates its structural invariants.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GraphError {
    #[error("state name '{name}' is declared more than once")]
    DuplicateState { name: String },
    #[error("state '{name}' has a non-finite payoff ({payoff})")]
    NonFinitePayoff { name: String, payoff: f64 },
    #[error("decision state '{name}' has no outgoing choices")]
    EmptyChoices { name: String },
    #[error("state '{name}' is terminal and cannot take choices")]
    TerminalHasChoices { name: String },
    #[error("choice from '{from}' points to unknown state #{to}")]
    DanglingChoice { from: String, to: usize },
    #[error("choice from '{from}' references unknown state '{to}'")]
    UnknownState { from: String, to: String },
    #[error("start state '{name}' is not part of the graph")]
    UnknownStart { name: String },
    #[error("choice weight {weight} on '{from}' must be finite and non-negative")]
    InvalidWeight { from: String, weight: f64 },
    #[error("choice weights on '{from}' must sum to a positive value")]
    ZeroTotalWeight { from: String },
}

/// Errors raised when simulation configuration invariants are violated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("episodes must be at least 1")]
    NoEpisodes,
    #[error("learning rate must be in (0, 1] (got {value})")]
    LearningRate { value: f64 },
    #[error("cost per step must be finite and non-positive (got {value})")]
    CostPerStep { value: f64 },
    #[error("max steps must be at least 1 when set")]
    ZeroStepBound,
}

/// Errors raised while walking a graph.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SimulationError {
    #[error("episode from '{start}' did not terminate within {steps} steps")]
    DidNotTerminate { start: String, steps: u64 },
    #[error("state #{index} is not part of the graph")]
    UnknownStateId { index: usize },
    #[error("choices of '{state}' carry no positive weight")]
    DegenerateChoices { state: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
