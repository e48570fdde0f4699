use std::path::Path;

use anyhow::Context;
use tracing::debug;

use fleetr_core::{Fleet, Selection};
use fleetr_plugins::Plan;

use crate::commands::{Output, execute};

pub async fn run(fleet: &Fleet, subset: &Selection<'_>, plan: &Path, out: Output) -> anyhow::Result<()> {
    let spec = Plan::load(plan)
        .and_then(Plan::into_task_spec)
        .with_context(|| format!("loading plan {}", plan.display()))?;
    debug!(plan = %plan.display(), steps = ?spec.step_names(), "plan loaded");

    execute(fleet, subset, &spec, out).await
}
