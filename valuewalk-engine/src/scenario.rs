//! JSON interchange format for decision graphs.
//!
//! States reference each other by name and may appear in any order. A state
//! without a `choices` key is terminal; an explicit empty list is rejected.
//!
//! ```json
//! {
//!   "name": "coin-flip",
//!   "start": "A",
//!   "states": [
//!     { "name": "B", "payoff": -5 },
//!     { "name": "C", "payoff": 10 },
//!     { "name": "A", "choices": [ { "to": "B" }, { "to": "C" } ] }
//!   ]
//! }
//! ```

use crate::constants::DEFAULT_CHOICE_WEIGHT;
use crate::error::GraphError;
use crate::graph::{Graph, GraphBuilder, SelectionRule, StateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A weighted edge referencing its destination by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    pub to: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

const fn default_weight() -> f64 {
    DEFAULT_CHOICE_WEIGHT
}

/// A state as written in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    pub name: String,
    #[serde(default)]
    pub payoff: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceSpec>>,
    #[serde(default, skip_serializing_if = "is_auto")]
    pub rule: SelectionRule,
}

fn is_auto(rule: &SelectionRule) -> bool {
    *rule == SelectionRule::Auto
}

/// A complete scenario: states plus the designated start state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub start: String,
    pub states: Vec<StateSpec>,
}

impl ScenarioSpec {
    /// Parse a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a scenario.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the scenario as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Build and validate the graph, resolving the start state.
    ///
    /// States keep the order in which they are listed.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for duplicate or unknown names and for any
    /// structural violation caught by [`GraphBuilder::build`].
    pub fn to_graph(&self) -> Result<(Graph, StateId), GraphError> {
        let mut builder = GraphBuilder::new();
        let mut ids: HashMap<&str, StateId> = HashMap::with_capacity(self.states.len());

        for state in &self.states {
            let id = match &state.choices {
                None => builder.terminal(state.name.clone(), state.payoff),
                Some(_) => builder.decision(state.name.clone(), state.payoff, state.rule),
            };
            if ids.insert(state.name.as_str(), id).is_some() {
                return Err(GraphError::DuplicateState {
                    name: state.name.clone(),
                });
            }
        }

        for state in &self.states {
            let (Some(choices), Some(&from)) = (&state.choices, ids.get(state.name.as_str()))
            else {
                continue;
            };
            for choice in choices {
                let to = ids
                    .get(choice.to.as_str())
                    .copied()
                    .ok_or_else(|| GraphError::UnknownState {
                        from: state.name.clone(),
                        to: choice.to.clone(),
                    })?;
                builder.choice(from, to, choice.weight);
            }
        }

        let graph = builder.build()?;
        let start = graph
            .id_of(&self.start)
            .ok_or_else(|| GraphError::UnknownStart {
                name: self.start.clone(),
            })?;
        Ok((graph, start))
    }

    /// Describe an existing graph in the interchange format.
    #[must_use]
    pub fn from_graph(name: impl Into<String>, graph: &Graph, start: StateId) -> Self {
        let name_of = |id: StateId| {
            graph
                .state(id)
                .map_or_else(|| id.to_string(), |state| state.name.clone())
        };
        let states = graph
            .states()
            .map(|(_, state)| StateSpec {
                name: state.name.clone(),
                payoff: state.payoff(),
                choices: (!state.is_terminal()).then(|| {
                    state
                        .choices()
                        .iter()
                        .map(|choice| ChoiceSpec {
                            to: name_of(choice.to),
                            weight: choice.weight,
                        })
                        .collect()
                }),
                rule: state.rule(),
            })
            .collect();
        Self {
            name: name.into(),
            description: String::new(),
            start: name_of(start),
            states,
        }
    }
}
