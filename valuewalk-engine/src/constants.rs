//! Centralized defaults for simulation runs.
//!
//! These mirror the parameters the reference ransomware study was run with,
//! so a bare `SimulationConfig::default()` reproduces it.

// Run parameters -----------------------------------------------------------
pub(crate) const DEFAULT_EPISODES: usize = 10_000;
pub(crate) const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub(crate) const DEFAULT_COST_PER_STEP: f64 = -1.0;

// Graph defaults -----------------------------------------------------------
pub(crate) const DEFAULT_CHOICE_WEIGHT: f64 = 1.0;
pub(crate) const INITIAL_STATE_VALUE: f64 = 0.0;

// RNG stream domain tags ---------------------------------------------------
pub(crate) const STREAM_TAG_BASELINE: &[u8] = b"valuewalk.baseline";
pub(crate) const STREAM_TAG_EPISODES: &[u8] = b"valuewalk.episodes";

// Presentation -------------------------------------------------------------
/// Significant digits used when displaying learned state values.
pub const VALUE_DISPLAY_DIGITS: usize = 5;
