use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use fleetr_common::models::{Getter, GetterData};
use fleetr_core::{Payload, SubTask, TaskContext, TaskError, TaskOutput};

/// Retrieves device state through the driver getters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    pub getters: Vec<Getter>,
}

impl Get {
    pub fn new<I: IntoIterator<Item = Getter>>(getters: I) -> Self {
        Self {
            getters: getters.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SubTask for Get {
    fn name(&self) -> &str {
        "get"
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
        if self.getters.is_empty() {
            return Err(TaskError::InvalidParams("no getter requested".into()));
        }

        let mut data = BTreeMap::new();
        for getter in &self.getters {
            debug!(getter = %getter, "retrieving");
            let value = match getter {
                Getter::Facts => GetterData::Facts(ctx.driver.get_facts().await?),
                Getter::Interfaces => GetterData::Interfaces(ctx.driver.get_interfaces().await?),
            };
            data.insert(*getter, value);
        }

        Ok(TaskOutput::new(Payload::Getters(data)))
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
