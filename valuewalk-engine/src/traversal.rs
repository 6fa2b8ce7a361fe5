//! Single-episode walks over a decision graph.
//!
//! Both walks start at a state, repeatedly pick an outgoing choice, add the
//! entered state's payoff and stop at the first terminal state. The step cost
//! is charged once at the end: `sum(payoffs) + cost_per_step * steps`.
//!
//! * [`run_baseline`] lets a maximizing actor pick where the graph says an
//!   actor decides (see [`SelectionRule`]); everything else is a weighted draw.
//! * [`run_episode`] always draws by weight and records the visited states.

use crate::error::SimulationError;
use crate::graph::{Choice, Graph, SelectionRule, State, StateId};
use crate::numbers::count_to_f64;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-walk cost and termination bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkLimits {
    /// Penalty charged per transition, expected to be `<= 0`.
    pub cost_per_step: f64,
    /// Fail the walk instead of looping once this many steps were taken.
    pub max_steps: Option<u64>,
}

impl WalkLimits {
    #[must_use]
    pub const fn new(cost_per_step: f64) -> Self {
        Self {
            cost_per_step,
            max_steps: None,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

/// Result of a baseline walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkOutcome {
    pub payoff: f64,
    pub steps: u64,
}

/// Result of a Monte Carlo episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    pub payoff: f64,
    pub steps: u64,
    /// Distinct states seen, start state included; revisits collapse.
    pub visited: BTreeSet<StateId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkKind {
    Baseline,
    Episodic,
}

/// Walk from `start` under the baseline policy.
///
/// # Errors
///
/// Returns [`SimulationError::UnknownStateId`] when `start` is not in the
/// graph and [`SimulationError::DidNotTerminate`] when `max_steps` is hit.
pub fn run_baseline<R: Rng + ?Sized>(
    graph: &Graph,
    start: StateId,
    limits: WalkLimits,
    rng: &mut R,
) -> Result<WalkOutcome, SimulationError> {
    walk(graph, start, limits, rng, WalkKind::Baseline, |_| {})
}

/// Walk from `start` drawing every choice by weight.
///
/// # Errors
///
/// Same conditions as [`run_baseline`].
pub fn run_episode<R: Rng + ?Sized>(
    graph: &Graph,
    start: StateId,
    limits: WalkLimits,
    rng: &mut R,
) -> Result<EpisodeOutcome, SimulationError> {
    let mut visited = BTreeSet::from([start]);
    let outcome = walk(graph, start, limits, rng, WalkKind::Episodic, |id| {
        visited.insert(id);
    })?;
    Ok(EpisodeOutcome {
        payoff: outcome.payoff,
        steps: outcome.steps,
        visited,
    })
}

fn walk<R, F>(
    graph: &Graph,
    start: StateId,
    limits: WalkLimits,
    rng: &mut R,
    kind: WalkKind,
    mut on_enter: F,
) -> Result<WalkOutcome, SimulationError>
where
    R: Rng + ?Sized,
    F: FnMut(StateId),
{
    let mut current = resolve(graph, start)?;
    let mut payoff_total = 0.0;
    let mut steps: u64 = 0;

    while !current.is_terminal() {
        if let Some(limit) = limits.max_steps
            && steps >= limit
        {
            let start_name = resolve(graph, start)?.name().to_string();
            log::warn!(
                "walk from '{start_name}' hit the {limit}-step bound at '{}'",
                current.name()
            );
            return Err(SimulationError::DidNotTerminate {
                start: start_name,
                steps,
            });
        }

        let picked = match kind {
            WalkKind::Baseline => baseline_pick(graph, current, rng),
            WalkKind::Episodic => choose_weighted(current.choices(), rng),
        };
        let Some(next_id) = picked.and_then(|idx| current.choices().get(idx)).map(|c| c.to)
        else {
            return Err(SimulationError::DegenerateChoices {
                state: current.name().to_string(),
            });
        };

        let next = resolve(graph, next_id)?;
        payoff_total += next.payoff();
        steps += 1;
        on_enter(next_id);
        current = next;
    }

    Ok(WalkOutcome {
        payoff: payoff_total + limits.cost_per_step * count_to_f64(steps),
        steps,
    })
}

fn resolve(graph: &Graph, id: StateId) -> Result<&State, SimulationError> {
    graph
        .state(id)
        .ok_or(SimulationError::UnknownStateId { index: id.index() })
}

fn baseline_pick<R: Rng + ?Sized>(graph: &Graph, state: &State, rng: &mut R) -> Option<usize> {
    let choices = state.choices();
    let maximize = match state.rule() {
        SelectionRule::Auto => all_weights_equal(choices),
        SelectionRule::Chance => false,
        SelectionRule::Actor => true,
    };
    if maximize {
        highest_payoff(graph, choices)
    } else {
        choose_weighted(choices, rng)
    }
}

#[allow(clippy::float_cmp)]
fn all_weights_equal(choices: &[Choice]) -> bool {
    choices
        .split_first()
        .is_none_or(|(first, rest)| rest.iter().all(|c| c.weight == first.weight))
}

/// Index of the first choice whose destination has the highest payoff.
///
/// Zero-weight choices are unreachable and never picked.
fn highest_payoff(graph: &Graph, choices: &[Choice]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, choice) in choices.iter().enumerate() {
        if choice.weight <= 0.0 {
            continue;
        }
        let payoff = graph.state(choice.to)?.payoff();
        if best.is_none_or(|(_, top)| payoff > top) {
            best = Some((idx, payoff));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Weighted categorical draw over `choices`.
///
/// Returns `None` when the weights do not sum to a positive, finite value.
pub fn choose_weighted<R: Rng + ?Sized>(choices: &[Choice], rng: &mut R) -> Option<usize> {
    let total: f64 = choices.iter().map(|choice| choice.weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let roll = rng.gen_range(0.0..total);
    let mut current = 0.0;
    for (idx, choice) in choices.iter().enumerate() {
        current += choice.weight;
        if roll < current && choice.weight > 0.0 {
            return Some(idx);
        }
    }

    // Rounding can leave the roll just past the accumulated sum.
    choices.iter().rposition(|choice| choice.weight > 0.0)
}
