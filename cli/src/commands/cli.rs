use fleetr_core::{Fleet, Selection, TaskSpec};
use fleetr_plugins::Cli;

use crate::commands::{Output, execute};

pub async fn cli(fleet: &Fleet, subset: &Selection<'_>, commands: Vec<String>, out: Output) -> anyhow::Result<()> {
    let spec = TaskSpec::new("cli").then(Cli::new(commands));
    execute(fleet, subset, &spec, out).await
}
