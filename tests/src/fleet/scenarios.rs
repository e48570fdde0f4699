#![cfg(test)]

use fleetr_common::models::{Getter, GetterData};
use fleetr_core::{Payload, RunError, TaskError, TaskSpec};
use fleetr_plugins::{Cli, Configure, Get};
use fleetr_protocols::simulated::INVALID_INPUT;

use crate::fixtures::{fleet, fleet_on, lab};

const NTP: &str = "ntp server 10.0.0.1\nntp server 10.0.0.2";

/************* Gathering state **************/

#[tokio::test]
async fn get_facts_should_succeed_on_every_router() {
    let (fleet, _) = fleet(lab(), 4, false);
    let subset = fleet.select(|d| d.name == "rt1" || d.name == "rt2");
    let spec = TaskSpec::new("facts").then(Get::new([Getter::Facts]));

    let results = fleet.run(&subset, &spec).await;

    assert_eq!(results.len(), 2);
    assert!(!results.failed());
    for entry in results.iter() {
        let output = entry.get("get").and_then(|r| r.outcome.output()).unwrap();
        let Payload::Getters(data) = &output.payload else {
            panic!("expected getter payload, got {:?}", output.payload);
        };
        let Some(GetterData::Facts(facts)) = data.get(&Getter::Facts) else {
            panic!("facts missing for {}", entry.device);
        };
        assert_eq!(facts.hostname, entry.device);
        assert!(!output.changed);
    }
}

#[tokio::test]
async fn unreachable_router_should_not_hide_the_others() {
    let (fleet, _) = fleet(lab(), 4, false);
    let subset = fleet.select(|d| d.in_group("edge"));
    let spec = TaskSpec::new("facts").then(Get::new([Getter::Facts]));

    let results = fleet.run(&subset, &spec).await;

    assert_eq!(results.failed_devices(), ["rt3"]);
    assert!(!results.get("rt2").unwrap().failed());
    let failure = results.get("rt3").unwrap().failure().unwrap();
    assert_eq!(failure.name, "get");
    assert!(matches!(failure.outcome.error(), Some(TaskError::Connection(_))));

    let err = results.raise_on_error().unwrap_err();
    assert!(matches!(err, RunError::Failed { ref devices } if devices == &["rt3".to_string()]));
}

/************* Stopping on failure **************/

#[tokio::test]
async fn rejected_configuration_should_stop_before_later_steps() {
    let (fleet, connector) = fleet(lab(), 4, false);
    let subset = fleet.select(|d| d.name == "rt1");
    let spec = TaskSpec::new("broken")
        .then(Cli::new(["show x"]))
        .then(Configure::merge("bad syntax"))
        .then(Get::new([Getter::Facts]));

    let results = fleet.run(&subset, &spec).await;
    let rt1 = results.get("rt1").unwrap();

    assert_eq!(rt1.len(), 2);
    let cli = rt1.get("cli").unwrap();
    let Some(Payload::Cli(outputs)) = cli.outcome.output().map(|o| &o.payload) else {
        panic!("expected cli payload");
    };
    assert_eq!(outputs["show x"], INVALID_INPUT);

    let configure = rt1.get("configure").unwrap();
    assert!(matches!(
        configure.outcome.error(),
        Some(TaskError::Rejected(msg)) if msg.contains("bad syntax")
    ));
    assert!(rt1.get("get").is_none());

    let running = connector.running_config("rt1").unwrap();
    assert!(!running.to_string().contains("bad syntax"));
}

/************* Dry run and commit **************/

#[tokio::test]
async fn dry_run_should_report_changes_without_applying_them() {
    let (dry, connector) = fleet(lab(), 4, true);
    let subset = dry.select(|d| d.name == "rt1" || d.name == "rt2");
    let spec = TaskSpec::new("ntp").then(Configure::merge(NTP));

    let preview = dry.run(&subset, &spec).await;
    assert_eq!(preview.changed_devices(), ["rt1", "rt2"]);
    assert!(connector.running_config("rt1").unwrap().section("ntp server 10.0.0.1").is_none());

    let live = fleet_on(&connector, lab(), 4, false);
    let subset = live.select(|d| d.name == "rt1" || d.name == "rt2");
    let applied = live.run(&subset, &spec).await;
    assert_eq!(applied.changed_devices(), ["rt1", "rt2"]);
    assert!(connector.running_config("rt2").unwrap().section("ntp server 10.0.0.2").is_some());

    let again = live.run(&subset, &spec).await;
    assert!(again.changed_devices().is_empty());
    assert!(!again.failed());
}

#[tokio::test]
async fn step_override_should_preview_even_on_a_live_run() {
    let (fleet, connector) = fleet(lab(), 4, false);
    let subset = fleet.select(|d| d.name == "rt1");
    let spec = TaskSpec::new("ntp").then(Configure::merge(NTP).with_dry_run(true));

    let results = fleet.run(&subset, &spec).await;
    let output = results.get("rt1").unwrap().get("configure").unwrap().outcome.output().unwrap();

    assert!(output.changed);
    assert!(matches!(&output.payload, Payload::Config(change) if !change.committed));
    assert!(connector.running_config("rt1").unwrap().section("ntp server 10.0.0.1").is_none());
}
