//! Task specs written down as TOML.
//!
//! ```toml
//! name = "ntp-rollout"
//!
//! [[steps]]
//! task = "get"
//! getters = ["facts"]
//!
//! [[steps]]
//! task = "configure"
//! file = "ntp.cfg"        # relative to the plan file
//! dry_run = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use fleetr_common::models::Getter;
use fleetr_core::TaskSpec;

use crate::{Cli, Configure, Get};

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum StepDef {
    Get {
        getters: Vec<Getter>,
    },
    Cli {
        commands: Vec<String>,
    },
    Configure {
        configuration: Option<String>,
        file: Option<PathBuf>,
        #[serde(default)]
        replace: bool,
        dry_run: Option<bool>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepDef>,
    /// Directory `file` entries are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = read(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml_str(&raw, base_dir)
    }

    pub fn from_toml_str(raw: &str, base_dir: impl Into<PathBuf>) -> Result<Self, PlanError> {
        let mut plan: Plan = toml::from_str(raw)?;
        plan.base_dir = base_dir.into();
        Ok(plan)
    }

    /// Builds the task spec, reading any referenced configuration files.
    pub fn into_task_spec(self) -> Result<TaskSpec, PlanError> {
        let mut spec = TaskSpec::new(&self.name);

        for (index, step) in self.steps.into_iter().enumerate() {
            let invalid = |reason: &str| PlanError::InvalidStep {
                index: index + 1,
                reason: reason.to_string(),
            };

            spec = match step {
                StepDef::Get { getters } => spec.then(Get::new(getters)),
                StepDef::Cli { commands } => spec.then(Cli::new(commands)),
                StepDef::Configure {
                    configuration,
                    file,
                    replace,
                    dry_run,
                } => {
                    let configuration = match (configuration, file) {
                        (Some(text), None) => text,
                        (None, Some(file)) => read(&self.base_dir.join(file))?,
                        (Some(_), Some(_)) => return Err(invalid("set either `configuration` or `file`, not both")),
                        (None, None) => return Err(invalid("configure needs `configuration` or `file`")),
                    };
                    spec.then(Configure {
                        configuration,
                        replace,
                        dry_run,
                    })
                }
            };
        }

        Ok(spec)
    }
}

fn read(path: &Path) -> Result<String, PlanError> {
    std::fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
