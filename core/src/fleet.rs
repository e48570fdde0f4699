use std::sync::Arc;

use fleetr_common::config::Config;
use fleetr_common::error::InventoryError;
use fleetr_common::inventory::{Device, Inventory};
use fleetr_protocols::{Connector, DriverRegistry};

use crate::result::{DeviceResult, ResultSet};
use crate::runner::{RunOptions, Runner};
use crate::selector::{Filter, Selection, select};
use crate::task::TaskSpec;

/// Configuration, inventory and runner for one invocation.
///
/// Built explicitly and passed around; there is no process-wide state.
pub struct Fleet {
    config: Config,
    inventory: Inventory,
    runner: Runner,
}

impl Fleet {
    pub fn new(config: Config, inventory: Inventory, connector: Arc<dyn Connector>) -> Self {
        let runner = Runner::new(connector, RunOptions::from(&config));
        Self {
            config,
            inventory,
            runner,
        }
    }

    /// Loads the inventory named by the configuration and wires the bundled drivers.
    pub fn from_config(config: Config) -> Result<Self, InventoryError> {
        let inventory = Inventory::load(&config.inventory.path)?;
        let registry =
            DriverRegistry::with_defaults().with_default_platform(config.inventory.default_platform.clone());
        Ok(Self::new(config, inventory, Arc::new(registry)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn select<P>(&self, predicate: P) -> Selection<'_>
    where
        P: Fn(&Device) -> bool,
    {
        select(&self.inventory, predicate)
    }

    pub fn filter(&self, filter: &Filter) -> Selection<'_> {
        filter.select(&self.inventory)
    }

    pub async fn run(&self, subset: &Selection<'_>, spec: &TaskSpec) -> ResultSet {
        self.runner.run(subset, spec).await
    }

    pub async fn run_with_progress<F>(&self, subset: &Selection<'_>, spec: &TaskSpec, on_device: F) -> ResultSet
    where
        F: FnMut(&DeviceResult),
    {
        self.runner.run_with_progress(subset, spec, on_device).await
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
