//! Runs a [`TaskSpec`] across a [`Selection`].
//!
//! Each device gets one future: open a session, walk the sub-tasks in order,
//! stop at the first failure, close the session. Device futures are driven
//! together and bounded by a semaphore of `num_workers` permits. Nothing a
//! device does can abort the run or touch another device's results.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, info, info_span, warn};

use fleetr_common::config::Config;
use fleetr_common::inventory::Device;
use fleetr_protocols::{ConnectOptions, Connector};

use crate::error::TaskError;
use crate::result::{DeviceResult, Outcome, ResultSet, SubTaskResult};
use crate::selector::Selection;
use crate::task::{TaskContext, TaskSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub num_workers: usize,
    pub dry_run: bool,
    pub connect: ConnectOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            num_workers: config.runner.num_workers,
            dry_run: config.dry_run,
            connect: ConnectOptions::from(&config.runner),
        }
    }
}

#[derive(Clone)]
pub struct Runner {
    connector: Arc<dyn Connector>,
    options: RunOptions,
}

impl Runner {
    pub fn new(connector: Arc<dyn Connector>, options: RunOptions) -> Self {
        Self { connector, options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub async fn run(&self, subset: &Selection<'_>, spec: &TaskSpec) -> ResultSet {
        self.run_with_progress(subset, spec, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_device` as each device finishes.
    pub async fn run_with_progress<F>(
        &self,
        subset: &Selection<'_>,
        spec: &TaskSpec,
        mut on_device: F,
    ) -> ResultSet
    where
        F: FnMut(&DeviceResult),
    {
        let workers = self.options.num_workers.max(1);
        info!(
            task = spec.name(),
            devices = subset.len(),
            workers,
            dry_run = self.options.dry_run,
            "starting run"
        );
        let started = Instant::now();

        let semaphore = Semaphore::new(workers);
        let semaphore = &semaphore;
        let mut pending: FuturesUnordered<_> = subset
            .devices()
            .map(|device| {
                let span = info_span!("device", name = %device.name);
                async move {
                    // The semaphore is never closed, a missing permit cannot happen.
                    let _permit = semaphore.acquire().await.ok();
                    self.run_device(device, spec).await
                }
                .instrument(span)
            })
            .collect();

        let mut results = ResultSet::new(spec.name());
        while let Some(device_result) = pending.next().await {
            on_device(&device_result);
            results.insert(device_result);
        }

        info!(
            task = spec.name(),
            failed = results.failed_devices().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        results
    }

    async fn run_device(&self, device: &Device, spec: &TaskSpec) -> DeviceResult {
        let mut result = DeviceResult::new(&device.name);
        let Some(first) = spec.steps().first() else {
            return result;
        };

        let started = Instant::now();
        let connecting = AssertUnwindSafe(self.connector.connect(device, &self.options.connect)).catch_unwind();
        let connected = match connecting.await {
            Ok(connected) => connected.map_err(|e| {
                warn!(device = %device.name, error = %e, "connection failed");
                TaskError::Connection(e.to_string())
            }),
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                warn!(device = %device.name, panic = %msg, "connector panicked");
                Err(TaskError::Panicked(msg))
            }
        };
        let mut driver = match connected {
            Ok(driver) => driver,
            Err(err) => {
                result.push(SubTaskResult {
                    name: first.name().to_string(),
                    outcome: Outcome::Failure(err),
                    elapsed: started.elapsed(),
                });
                return result;
            }
        };

        let mut ctx = TaskContext {
            device,
            driver: &mut *driver,
            dry_run: self.options.dry_run,
        };

        for step in spec.steps() {
            let started = Instant::now();
            let outcome = match AssertUnwindSafe(step.run(&mut ctx)).catch_unwind().await {
                Ok(result) => Outcome::from(result),
                Err(panic) => Outcome::Failure(TaskError::Panicked(panic_message(panic.as_ref()))),
            };
            let elapsed = started.elapsed();
            let failed = outcome.is_failure();

            match outcome.error() {
                Some(err) => warn!(step = step.name(), error = %err, "sub-task failed"),
                None => debug!(step = step.name(), elapsed_ms = elapsed.as_millis() as u64, "sub-task done"),
            }

            result.push(SubTaskResult {
                name: step.name().to_string(),
                outcome,
                elapsed,
            });
            if failed {
                break;
            }
        }

        match AssertUnwindSafe(driver.close()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(device = %device.name, error = %e, "closing session failed"),
            Err(panic) => warn!(device = %device.name, panic = %panic_message(panic.as_ref()), "closing session panicked"),
        }
        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use fleetr_common::inventory::Inventory;
    use fleetr_protocols::simulated::SimulatedConnector;
    use fleetr_protocols::{DeviceDriver, DriverError};

    use crate::selector::select;
    use crate::task::{Payload, SubTask, TaskOutput};

    struct Hostname;

    #[async_trait]
    impl SubTask for Hostname {
        fn name(&self) -> &str {
            "hostname"
        }

        async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
            let out = ctx.driver.cli("show hostname").await?;
            Ok(TaskOutput::new(Payload::Text(out)))
        }
    }

    struct FailOn(&'static str);

    #[async_trait]
    impl SubTask for FailOn {
        fn name(&self) -> &str {
            "fail_on"
        }

        async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
            if ctx.device.name == self.0 {
                return Err(TaskError::Failed("injected".into()));
            }
            Ok(TaskOutput::empty())
        }
    }

    struct Boom;

    #[async_trait]
    impl SubTask for Boom {
        fn name(&self) -> &str {
            "boom"
        }

        async fn run(&self, _ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
            panic!("driver state corrupted");
        }
    }

    /// Panics while connecting to one device, simulated everywhere else.
    struct PanicOn(&'static str, SimulatedConnector);

    #[async_trait]
    impl Connector for PanicOn {
        async fn connect(&self, device: &Device, options: &ConnectOptions) -> Result<Box<dyn DeviceDriver>, DriverError> {
            if device.name == self.0 {
                panic!("transport bug on {}", self.0);
            }
            self.1.connect(device, options).await
        }
    }

    fn lab() -> Inventory {
        Inventory::from_devices([
            Device::new("rt1").with_platform("simulated"),
            Device::new("rt2").with_platform("simulated"),
            Device::new("rt3").with_data("unreachable", "true"),
        ])
        .unwrap()
    }

    fn runner(workers: usize) -> Runner {
        let options = RunOptions {
            num_workers: workers,
            ..RunOptions::default()
        };
        Runner::new(Arc::new(SimulatedConnector::new()), options)
    }

    #[tokio::test]
    async fn run_should_produce_one_entry_per_device() {
        let inventory = lab();
        let subset = select(&inventory, |_| true);
        let spec = TaskSpec::new("hostnames").then(Hostname).then(Hostname);

        let results = runner(2).run(&subset, &spec).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.name(), "hostnames");
        for device in results.iter() {
            assert!(device.len() <= spec.len());
        }
        assert_eq!(results.get("rt1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn run_should_record_connection_failure_under_first_step() {
        let inventory = lab();
        let subset = select(&inventory, |d| d.name == "rt3");
        let spec = TaskSpec::new("hostnames").then(Hostname).then(Hostname);

        let results = runner(1).run(&subset, &spec).await;
        let rt3 = results.get("rt3").unwrap();

        assert_eq!(rt3.len(), 1);
        assert_eq!(rt3.results[0].name, "hostname");
        assert!(matches!(
            rt3.results[0].outcome,
            Outcome::Failure(TaskError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn run_should_stop_device_at_first_failure_only() {
        let inventory = lab();
        let subset = select(&inventory, |d| d.name != "rt3");
        let spec = TaskSpec::new("fail-fast")
            .then(Hostname)
            .then(FailOn("rt1"))
            .then(Hostname);

        let results = runner(4).run(&subset, &spec).await;

        assert_eq!(results.get("rt1").unwrap().len(), 2);
        assert_eq!(results.get("rt2").unwrap().len(), 3);
        assert_eq!(results.failed_devices(), ["rt1"]);
    }

    #[tokio::test]
    async fn run_should_capture_panics_as_failures() {
        let inventory = lab();
        let subset = select(&inventory, |d| d.name == "rt1");
        let spec = TaskSpec::new("panic").then(Hostname).then(Boom).then(Hostname);

        let results = runner(1).run(&subset, &spec).await;
        let rt1 = results.get("rt1").unwrap();

        assert_eq!(rt1.len(), 2);
        assert_eq!(
            rt1.results[1].outcome,
            Outcome::Failure(TaskError::Panicked("driver state corrupted".into()))
        );
    }

    #[tokio::test]
    async fn connector_panic_should_stay_on_its_device() {
        let inventory = lab();
        let subset = select(&inventory, |d| d.name != "rt3");
        let spec = TaskSpec::new("hostnames").then(Hostname).then(Hostname);
        let runner = Runner::new(Arc::new(PanicOn("rt1", SimulatedConnector::new())), RunOptions::default());

        let results = runner.run(&subset, &spec).await;

        assert_eq!(results.len(), 2);
        let rt1 = results.get("rt1").unwrap();
        assert_eq!(rt1.len(), 1);
        assert_eq!(rt1.results[0].name, "hostname");
        assert_eq!(
            rt1.results[0].outcome,
            Outcome::Failure(TaskError::Panicked("transport bug on rt1".into()))
        );
        assert_eq!(results.get("rt2").unwrap().len(), 2);
        assert!(!results.get("rt2").unwrap().failed());
    }

    #[tokio::test]
    async fn empty_task_spec_should_yield_empty_entries() {
        let inventory = lab();
        let subset = select(&inventory, |_| true);

        let results = runner(2).run(&subset, &TaskSpec::new("nothing")).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(DeviceResult::is_empty));
        assert!(!results.failed());
    }

    #[tokio::test]
    async fn run_with_progress_should_report_every_device() {
        let inventory = lab();
        let subset = select(&inventory, |_| true);
        let spec = TaskSpec::new("hostnames").then(Hostname);
        let seen = AtomicUsize::new(0);

        runner(1)
            .run_with_progress(&subset, &spec, |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
