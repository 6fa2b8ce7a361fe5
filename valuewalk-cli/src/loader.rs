use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use valuewalk_engine::{GraphError, GraphLoader, ScenarioSpec};

use crate::catalog::find_scenario;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unknown scenario '{0}' (see --list-scenarios)")]
    UnknownScenario(String),
    #[error("built-in scenario '{key}' is malformed: {source}")]
    Catalog {
        key: String,
        #[source]
        source: GraphError,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the scenario graph comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioSource {
    Builtin(String),
    File(PathBuf),
}

impl GraphLoader for ScenarioSource {
    type Error = LoadError;

    fn load_scenario(&self) -> Result<ScenarioSpec, Self::Error> {
        match self {
            Self::Builtin(key) => {
                let entry =
                    find_scenario(key).ok_or_else(|| LoadError::UnknownScenario(key.clone()))?;
                entry.build().map_err(|source| LoadError::Catalog {
                    key: key.clone(),
                    source,
                })
            }
            Self::File(path) => {
                let display = path.display().to_string();
                let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
                    path: display.clone(),
                    source,
                })?;
                let mut spec = ScenarioSpec::from_json(&raw).map_err(|source| LoadError::Parse {
                    path: display,
                    source,
                })?;
                if spec.name.is_empty() {
                    spec.name = path
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().into_owned())
                        .unwrap_or_default();
                }
                Ok(spec)
            }
        }
    }
}
