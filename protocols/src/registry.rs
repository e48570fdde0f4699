use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use fleetr_common::inventory::Device;

use crate::driver::{ConnectOptions, Connector, DeviceDriver, DriverError};
use crate::simulated::SimulatedConnector;
use crate::tcp_cli::TcpCliConnector;

pub const SIMULATED_PLATFORM: &str = "simulated";
pub const CLI_PLATFORM: &str = "cli";

/// Maps platform names to connectors and dispatches on `device.platform`.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
    default_platform: Option<String>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled drivers: `simulated` and `cli`.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(SIMULATED_PLATFORM, Arc::new(SimulatedConnector::new()))
            .register(CLI_PLATFORM, Arc::new(TcpCliConnector))
    }

    pub fn register(mut self, platform: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        self.connectors.insert(platform.into(), connector);
        self
    }

    pub fn with_default_platform(mut self, platform: Option<String>) -> Self {
        self.default_platform = platform;
        self
    }

    pub fn platforms(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn connector_for(&self, device: &Device) -> Result<&Arc<dyn Connector>, DriverError> {
        let platform = device
            .platform
            .as_deref()
            .or(self.default_platform.as_deref())
            .ok_or(DriverError::MissingPlatform)?;

        self.connectors
            .get(platform)
            .ok_or_else(|| DriverError::UnsupportedPlatform(platform.to_string()))
    }
}

#[async_trait]
impl Connector for DriverRegistry {
    async fn connect(
        &self,
        device: &Device,
        options: &ConnectOptions,
    ) -> Result<Box<dyn DeviceDriver>, DriverError> {
        let connector = self.connector_for(device)?;
        debug!(device = %device.name, "opening session");
        connector.connect(device, options).await
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
