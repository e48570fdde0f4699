use fleetr_common::models::Getter;
use fleetr_core::{Fleet, Selection, TaskSpec};
use fleetr_plugins::Get;

use crate::commands::{Output, execute};

pub async fn get(fleet: &Fleet, subset: &Selection<'_>, getters: Vec<Getter>, out: Output) -> anyhow::Result<()> {
    let spec = TaskSpec::new("get").then(Get::new(getters));
    execute(fleet, subset, &spec, out).await
}
