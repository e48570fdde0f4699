use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use fleetr_common::config::Config;
use fleetr_common::inventory::{Device, Inventory};
use fleetr_core::{Fleet, SubTask, TaskContext, TaskError, TaskOutput};
use fleetr_protocols::simulated::SimulatedConnector;

/// rt1 and rt2 answer, rt3 never does.
pub fn lab() -> Inventory {
    Inventory::from_devices([
        Device::new("rt1")
            .with_platform("simulated")
            .with_group("core")
            .with_data("vendor", "Cisco"),
        Device::new("rt2")
            .with_platform("simulated")
            .with_group("edge"),
        Device::new("rt3")
            .with_platform("simulated")
            .with_group("edge")
            .with_data("unreachable", "true"),
    ])
    .expect("lab inventory has unique names")
}

/// `count` reachable simulated devices named sw0, sw1, ...
pub fn switches(count: usize) -> Inventory {
    Inventory::from_devices((0..count).map(|i| Device::new(format!("sw{i}")).with_platform("simulated")))
        .expect("switch names are unique")
}

/// A fleet over `inventory` sharing device state with the returned connector.
pub fn fleet(inventory: Inventory, num_workers: usize, dry_run: bool) -> (Fleet, SimulatedConnector) {
    let connector = SimulatedConnector::new();
    (fleet_on(&connector, inventory, num_workers, dry_run), connector)
}

/// A fleet reusing the device state of an existing connector.
pub fn fleet_on(connector: &SimulatedConnector, inventory: Inventory, num_workers: usize, dry_run: bool) -> Fleet {
    let mut config = Config::default();
    config.runner.num_workers = num_workers;
    config.dry_run = dry_run;
    Fleet::new(config, inventory, Arc::new(connector.clone()))
}

/// Fails on one named device, succeeds with an empty payload elsewhere.
pub struct FailOn(pub &'static str);

#[async_trait]
impl SubTask for FailOn {
    fn name(&self) -> &str {
        "fail_on"
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
        if ctx.device.name == self.0 {
            return Err(TaskError::Failed(format!("injected failure on {}", self.0)));
        }
        Ok(TaskOutput::empty())
    }
}

/// Records how many devices were inside `run` at the same time. Push it
/// into a spec as a shared `Arc` to read the peak afterwards.
#[derive(Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubTask for ConcurrencyProbe {
    fn name(&self) -> &str {
        "probe"
    }

    async fn run(&self, _ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(TaskOutput::empty())
    }
}
