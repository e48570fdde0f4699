use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use fleetr_core::{Payload, SubTask, TaskContext, TaskError, TaskOutput};

/// Sends raw commands, in order, and keeps what the device answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub commands: Vec<String>,
}

impl Cli {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl SubTask for Cli {
    fn name(&self) -> &str {
        "cli"
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
        if self.commands.is_empty() {
            return Err(TaskError::InvalidParams("no command given".into()));
        }

        let mut outputs = BTreeMap::new();
        for command in &self.commands {
            debug!(command = %command, "sending");
            let output = ctx.driver.cli(command).await?;
            outputs.insert(command.clone(), output);
        }

        Ok(TaskOutput::new(Payload::Cli(outputs)))
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
