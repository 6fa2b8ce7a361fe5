//! Decision graph model: states, weighted choices and the arena that owns them.
//!
//! Every state lives in a [`Graph`] arena in creation order; a [`Choice`]
//! links states by [`StateId`] index. Graphs are assembled through
//! [`GraphBuilder`], which validates the structure once so the traversal code
//! can rely on it afterwards.

use crate::constants::DEFAULT_CHOICE_WEIGHT;
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Stable index of a state inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(usize);

impl StateId {
    /// Id for the state at `index` in creation order.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Weighted outgoing edge of a decision state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub to: StateId,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Choice {
    /// Choice with the default selection weight of 1.
    #[must_use]
    pub const fn new(to: StateId) -> Self {
        Self {
            to,
            weight: DEFAULT_CHOICE_WEIGHT,
        }
    }

    #[must_use]
    pub const fn weighted(to: StateId, weight: f64) -> Self {
        Self { to, weight }
    }
}

const fn default_weight() -> f64 {
    DEFAULT_CHOICE_WEIGHT
}

/// Who decides between the choices of a decision state during the baseline walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// Equal sibling weights mean a maximizing actor, anything else is chance.
    #[default]
    Auto,
    /// Always a weighted random draw.
    Chance,
    /// Always the destination with the highest payoff.
    Actor,
}

pub type ChoiceSet = SmallVec<[Choice; 4]>;

/// Terminal or decision node carrying the payoff earned on entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Terminal {
        payoff: f64,
    },
    Decision {
        payoff: f64,
        choices: ChoiceSet,
        rule: SelectionRule,
    },
}

/// A named state in the decision graph.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    pub node: Node,
}

impl State {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payoff added to an episode's total each time the state is entered.
    #[must_use]
    pub fn payoff(&self) -> f64 {
        match self.node {
            Node::Terminal { payoff } | Node::Decision { payoff, .. } => payoff,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.node, Node::Terminal { .. })
    }

    /// Outgoing choices; empty for terminal states.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        match &self.node {
            Node::Terminal { .. } => &[],
            Node::Decision { choices, .. } => choices,
        }
    }

    #[must_use]
    pub fn rule(&self) -> SelectionRule {
        match self.node {
            Node::Terminal { .. } => SelectionRule::Auto,
            Node::Decision { rule, .. } => rule,
        }
    }
}

/// Arena holding every state in creation order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    states: Vec<State>,
    index: HashMap<String, StateId>,
}

impl Graph {
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&State> {
        self.id_of(name).and_then(|id| self.state(id))
    }

    /// All states in creation order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(idx, state)| (StateId(idx), state))
    }

    pub fn terminals(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states().filter(|(_, state)| state.is_terminal())
    }

    pub fn decisions(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states().filter(|(_, state)| !state.is_terminal())
    }
}

/// Incremental, validating constructor for [`Graph`].
///
/// Decision states may be declared before their destinations exist, which
/// is how cyclic graphs are expressed.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    states: Vec<State>,
    misplaced: Vec<StateId>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a terminal state.
    pub fn terminal(&mut self, name: impl Into<String>, payoff: f64) -> StateId {
        self.push(State {
            name: name.into(),
            node: Node::Terminal { payoff },
        })
    }

    /// Register a decision state whose choices are attached later.
    pub fn decision(
        &mut self,
        name: impl Into<String>,
        payoff: f64,
        rule: SelectionRule,
    ) -> StateId {
        self.push(State {
            name: name.into(),
            node: Node::Decision {
                payoff,
                choices: ChoiceSet::new(),
                rule,
            },
        })
    }

    /// Register a decision state together with its choices.
    pub fn decision_with(
        &mut self,
        name: impl Into<String>,
        payoff: f64,
        choices: impl IntoIterator<Item = Choice>,
    ) -> StateId {
        let id = self.decision(name, payoff, SelectionRule::Auto);
        self.choices(id, choices);
        id
    }

    /// Attach one weighted choice to `from`.
    pub fn choice(&mut self, from: StateId, to: StateId, weight: f64) -> &mut Self {
        self.attach(from, Choice::weighted(to, weight));
        self
    }

    pub fn choices(
        &mut self,
        from: StateId,
        choices: impl IntoIterator<Item = Choice>,
    ) -> &mut Self {
        for choice in choices {
            self.attach(from, choice);
        }
        self
    }

    /// Validate the structure and freeze it into a [`Graph`].
    ///
    /// # Errors
    ///
    /// Returns the first structural violation found: duplicate names,
    /// non-finite payoffs, choices on terminals, decisions without choices,
    /// dangling destinations, or invalid weights.
    pub fn build(self) -> Result<Graph, GraphError> {
        if let Some(id) = self.misplaced.first() {
            let name = self
                .states
                .get(id.0)
                .map_or_else(|| id.to_string(), |state| state.name.clone());
            return Err(GraphError::TerminalHasChoices { name });
        }

        let mut index = HashMap::with_capacity(self.states.len());
        for (idx, state) in self.states.iter().enumerate() {
            if index.insert(state.name.clone(), StateId(idx)).is_some() {
                return Err(GraphError::DuplicateState {
                    name: state.name.clone(),
                });
            }
            if !state.payoff().is_finite() {
                return Err(GraphError::NonFinitePayoff {
                    name: state.name.clone(),
                    payoff: state.payoff(),
                });
            }
        }

        for state in &self.states {
            if let Node::Decision { choices, .. } = &state.node {
                validate_choices(state.name(), choices, self.states.len())?;
            }
        }

        Ok(Graph {
            states: self.states,
            index,
        })
    }

    fn push(&mut self, state: State) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(state);
        id
    }

    fn attach(&mut self, from: StateId, choice: Choice) {
        match self.states.get_mut(from.0).map(|state| &mut state.node) {
            Some(Node::Decision { choices, .. }) => choices.push(choice),
            _ => self.misplaced.push(from),
        }
    }
}

fn validate_choices(from: &str, choices: &[Choice], state_count: usize) -> Result<(), GraphError> {
    if choices.is_empty() {
        return Err(GraphError::EmptyChoices {
            name: from.to_string(),
        });
    }
    let mut total = 0.0;
    for choice in choices {
        if choice.to.0 >= state_count {
            return Err(GraphError::DanglingChoice {
                from: from.to_string(),
                to: choice.to.0,
            });
        }
        if !choice.weight.is_finite() || choice.weight < 0.0 {
            return Err(GraphError::InvalidWeight {
                from: from.to_string(),
                weight: choice.weight,
            });
        }
        total += choice.weight;
    }
    if total <= 0.0 || !total.is_finite() {
        return Err(GraphError::ZeroTotalWeight {
            from: from.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin_flip() -> (Graph, StateId) {
        let mut builder = GraphBuilder::new();
        let low = builder.terminal("B", -5.0);
        let high = builder.terminal("C", 10.0);
        let start = builder.decision_with("A", 0.0, [Choice::new(low), Choice::new(high)]);
        (builder.build().expect("valid graph"), start)
    }

    #[test]
    fn registry_preserves_creation_order() {
        let (graph, start) = coin_flip();
        let names: Vec<&str> = graph.states().map(|(_, state)| state.name()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
        assert_eq!(graph.id_of("A"), Some(start));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn terminal_iff_no_choices() {
        let (graph, start) = coin_flip();
        let a = graph.state(start).unwrap();
        assert!(!a.is_terminal());
        assert_eq!(a.choices().len(), 2);
        let b = graph.by_name("B").unwrap();
        assert!(b.is_terminal());
        assert!(b.choices().is_empty());
        assert_eq!(graph.terminals().count(), 2);
        assert_eq!(graph.decisions().count(), 1);
    }

    #[test]
    fn default_choice_weight_is_one() {
        let (graph, start) = coin_flip();
        let weights: Vec<f64> = graph
            .state(start)
            .unwrap()
            .choices()
            .iter()
            .map(|c| c.weight)
            .collect();
        assert_eq!(weights, vec![1.0, 1.0]);
    }

    #[test]
    fn rejects_decision_without_choices() {
        let mut builder = GraphBuilder::new();
        builder.decision("lonely", 0.0, SelectionRule::Auto);
        assert_eq!(
            builder.build().unwrap_err(),
            GraphError::EmptyChoices {
                name: "lonely".to_string()
            }
        );
    }

    #[test]
    fn rejects_negative_and_zero_weights() {
        let mut builder = GraphBuilder::new();
        let end = builder.terminal("end", 0.0);
        let start = builder.decision("start", 0.0, SelectionRule::Auto);
        builder.choice(start, end, -1.0);
        assert!(matches!(
            builder.build(),
            Err(GraphError::InvalidWeight { weight, .. }) if weight < 0.0
        ));

        let mut builder = GraphBuilder::new();
        let end = builder.terminal("end", 0.0);
        let start = builder.decision("start", 0.0, SelectionRule::Auto);
        builder.choice(start, end, 0.0);
        assert!(matches!(
            builder.build(),
            Err(GraphError::ZeroTotalWeight { .. })
        ));
    }

    #[test]
    fn rejects_duplicates_dangling_and_terminal_choices() {
        let mut builder = GraphBuilder::new();
        builder.terminal("twin", 0.0);
        builder.terminal("twin", 1.0);
        assert!(matches!(
            builder.build(),
            Err(GraphError::DuplicateState { .. })
        ));

        let mut builder = GraphBuilder::new();
        let start = builder.decision("start", 0.0, SelectionRule::Auto);
        builder.choice(start, StateId(9), 1.0);
        assert!(matches!(
            builder.build(),
            Err(GraphError::DanglingChoice { to: 9, .. })
        ));

        let mut builder = GraphBuilder::new();
        let end = builder.terminal("end", 0.0);
        builder.choice(end, end, 1.0);
        assert!(matches!(
            builder.build(),
            Err(GraphError::TerminalHasChoices { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_payoff() {
        let mut builder = GraphBuilder::new();
        builder.terminal("nan", f64::NAN);
        assert!(matches!(
            builder.build(),
            Err(GraphError::NonFinitePayoff { .. })
        ));
    }

    #[test]
    fn zero_weight_sibling_is_allowed_when_total_positive() {
        let mut builder = GraphBuilder::new();
        let a = builder.terminal("a", 0.0);
        let b = builder.terminal("b", 0.0);
        let start = builder.decision("start", 0.0, SelectionRule::Chance);
        builder.choice(start, a, 0.0).choice(start, b, 2.0);
        let graph = builder.build().unwrap();
        assert_eq!(graph.state(start).unwrap().rule(), SelectionRule::Chance);
    }
}
