#![cfg(test)]

use std::sync::Arc;

use fleetr_common::models::Getter;
use fleetr_core::{select_strict, SelectionError, TaskSpec};
use fleetr_plugins::{Cli, Get};

use crate::fixtures::{fleet, lab, switches, ConcurrencyProbe, FailOn};

/************* Shape of a result set **************/

#[tokio::test]
async fn every_selected_device_should_get_exactly_one_entry() {
    let (fleet, _) = fleet(lab(), 2, false);
    let subset = fleet.select(|_| true);
    let spec = TaskSpec::new("mixed")
        .then(Cli::new(["show hostname"]))
        .then(Get::new([Getter::Interfaces]))
        .then(Cli::new(["show interfaces brief"]));

    let results = fleet.run(&subset, &spec).await;

    assert_eq!(results.len(), subset.len());
    for name in subset.names() {
        let entry = results.get(name).unwrap();
        assert!(entry.len() <= spec.len());
        assert!(entry.len() >= 1);
    }
}

#[tokio::test]
async fn failure_at_step_k_should_leave_k_outcomes() {
    let (fleet, _) = fleet(switches(3), 3, false);
    let subset = fleet.select(|_| true);

    for k in 1..=3 {
        let mut spec = TaskSpec::new("fail-fast");
        for _ in 1..k {
            spec = spec.then(Cli::new(["show hostname"]));
        }
        spec = spec.then(FailOn("sw1")).then(Cli::new(["show hostname"]));

        let results = fleet.run(&subset, &spec).await;

        let failing = results.get("sw1").unwrap();
        assert_eq!(failing.len(), k);
        assert!(failing.outcomes().last().unwrap().is_failure());
        assert_eq!(results.get("sw0").unwrap().len(), k + 1);
    }
}

#[tokio::test]
async fn injected_failure_should_not_change_other_devices() {
    let (fleet, _) = fleet(lab(), 4, false);
    let subset = fleet.select(|d| d.name == "rt1" || d.name == "rt2");
    let quiet = TaskSpec::new("probe")
        .then(Cli::new(["show hostname", "show interfaces brief"]))
        .then(FailOn("nobody"));
    let failing = TaskSpec::new("probe")
        .then(Cli::new(["show hostname", "show interfaces brief"]))
        .then(FailOn("rt1"));

    let baseline = fleet.run(&subset, &quiet).await;
    let injected = fleet.run(&subset, &failing).await;

    assert!(injected.get("rt1").unwrap().failed());
    let before: Vec<_> = baseline.get("rt2").unwrap().outcomes().cloned().collect();
    let after: Vec<_> = injected.get("rt2").unwrap().outcomes().cloned().collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn read_only_spec_should_be_idempotent() {
    let (fleet, _) = fleet(lab(), 4, false);
    let subset = fleet.select(|d| d.name == "rt1");
    let spec = TaskSpec::new("read")
        .then(Get::new([Getter::Interfaces]))
        .then(Cli::new(["show running-config"]));

    let first = fleet.run(&subset, &spec).await;
    let second = fleet.run(&subset, &spec).await;

    let outcomes = |r: &fleetr_core::ResultSet| r.get("rt1").unwrap().outcomes().cloned().collect::<Vec<_>>();
    assert_eq!(outcomes(&first), outcomes(&second));
    assert!(second.changed_devices().is_empty());
}

/************* Worker pool **************/

#[tokio::test]
async fn pool_should_never_exceed_num_workers() {
    for workers in [1, 2, 4] {
        let (fleet, _) = fleet(switches(6), workers, false);
        let subset = fleet.select(|_| true);
        let probe = Arc::new(ConcurrencyProbe::default());
        let mut spec = TaskSpec::new("probe");
        spec.push(probe.clone());

        let results = fleet.run(&subset, &spec).await;

        assert_eq!(results.len(), 6);
        assert!(probe.peak() <= workers, "peak {} > {workers}", probe.peak());
        assert!(probe.peak() >= 1);
    }
}

/************* Selection **************/

#[tokio::test]
async fn strict_selection_should_refuse_an_empty_subset() {
    let inventory = lab();
    let err = select_strict(&inventory, |d| d.in_group("spine")).unwrap_err();
    assert!(matches!(err, SelectionError::Empty(_)));

    let (fleet, _) = fleet(lab(), 4, false);
    let empty = fleet.select(|d| d.in_group("spine"));
    let results = fleet.run(&empty, &TaskSpec::new("noop").then(Cli::new(["show hostname"]))).await;
    assert!(results.is_empty());
}
