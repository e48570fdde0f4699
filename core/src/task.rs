//! Units of work and their composition.
//!
//! A [`SubTask`] carries its own parameters and runs against one open device
//! session. A [`TaskSpec`] is a named, ordered list of them: plain data the
//! runner walks, stopping at the first failure on each device.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use fleetr_common::inventory::Device;
use fleetr_common::models::{Getter, GetterData};
use fleetr_protocols::DeviceDriver;

use crate::error::TaskError;

/// What a sub-task gets to work with on one device.
pub struct TaskContext<'a> {
    pub device: &'a Device,
    pub driver: &'a mut dyn DeviceDriver,
    /// Run-wide default, sub-tasks may override it.
    pub dry_run: bool,
}

#[async_trait]
pub trait SubTask: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigChange {
    pub diff: String,
    pub committed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Getters(BTreeMap<Getter, GetterData>),
    /// Output keyed by command.
    Cli(BTreeMap<String, String>),
    Config(ConfigChange),
    Text(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutput {
    pub payload: Payload,
    /// Whether the device state was (or would be, on a dry run) modified.
    pub changed: bool,
}

impl TaskOutput {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            changed: false,
        }
    }

    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }

    pub fn empty() -> Self {
        Self::new(Payload::Empty)
    }
}

#[derive(Clone)]
pub struct TaskSpec {
    name: String,
    steps: Vec<Arc<dyn SubTask>>,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step, builder style.
    pub fn then<S: SubTask + 'static>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn push(&mut self, step: Arc<dyn SubTask>) {
        self.steps.push(step);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Arc<dyn SubTask>] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
