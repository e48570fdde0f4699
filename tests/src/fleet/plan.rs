#![cfg(test)]

use std::fs;

use fleetr_core::{Filter, Payload};
use fleetr_plugins::Plan;

use crate::fixtures::{fleet, lab};

/************* Plans end to end **************/

const ROLLOUT: &str = r#"
    name = "ntp-rollout"
    description = "facts, then ntp servers"

    [[steps]]
    task = "get"
    getters = ["facts"]

    [[steps]]
    task = "configure"
    file = "ntp.cfg"
"#;

#[tokio::test]
async fn plan_should_drive_a_filtered_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("ntp.cfg"), "ntp server 10.0.0.1\n")?;
    let path = dir.path().join("rollout.toml");
    fs::write(&path, ROLLOUT)?;

    let spec = Plan::load(&path)?.into_task_spec()?;
    let (fleet, connector) = fleet(lab(), 4, false);
    let filter = Filter::new().with("vendor=Cisco".parse().map_err(anyhow::Error::msg)?);
    let subset = fleet.filter(&filter);

    let results = fleet.run(&subset, &spec).await;

    assert_eq!(results.name(), "ntp-rollout");
    assert_eq!(results.len(), 1);
    let rt1 = results.get("rt1").unwrap();
    assert_eq!(rt1.len(), 2);
    let output = rt1.get("configure").unwrap().outcome.output().unwrap();
    assert!(matches!(&output.payload, Payload::Config(change) if change.committed));
    assert!(connector.running_config("rt1").unwrap().section("ntp server 10.0.0.1").is_some());
    assert!(connector.running_config("rt2").is_none());
    Ok(())
}
