use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use fleetr_common::config::RunnerConfig;
use fleetr_common::inventory::Device;
use fleetr_common::models::{Facts, Interfaces};

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("could not connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("timed out after {0:?} waiting for the device")]
    Timeout(Duration),

    #[error("no driver registered for platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("device has no platform and no default platform is configured")]
    MissingPlatform,

    #[error("{operation} is not supported by the {platform} driver")]
    NotSupported {
        platform: String,
        operation: &'static str,
    },

    #[error("configuration rejected: {0}")]
    ConfigRejected(String),

    #[error("no candidate configuration loaded")]
    NoCandidate,

    #[error("session closed by the device")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// True for failures of the transport itself rather than of an operation.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            DriverError::Connect { .. }
                | DriverError::Timeout(_)
                | DriverError::UnsupportedPlatform(_)
                | DriverError::MissingPlatform
                | DriverError::Closed
                | DriverError::Io(_)
        )
    }
}

/// Timeouts a connector applies to the sessions it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}

impl From<&RunnerConfig> for ConnectOptions {
    fn from(cfg: &RunnerConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            command_timeout: cfg.command_timeout(),
        }
    }
}

/// How a candidate configuration is combined with the running one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Add to the running configuration, `no ...` lines remove.
    #[default]
    Merge,
    /// The candidate becomes the whole configuration.
    Replace,
}

/// An open session with one device.
///
/// Candidate handling follows the load / compare / commit-or-discard cycle:
/// nothing reaches the running configuration before [`commit_config`](Self::commit_config).
#[async_trait]
pub trait DeviceDriver: Send {
    fn platform(&self) -> &str;

    async fn get_facts(&mut self) -> Result<Facts, DriverError>;

    async fn get_interfaces(&mut self) -> Result<Interfaces, DriverError>;

    /// Runs one command and returns its raw output. A command the device does
    /// not understand is not an error: its complaint is the output.
    async fn cli(&mut self, command: &str) -> Result<String, DriverError>;

    async fn load_candidate(&mut self, config: &str, mode: LoadMode) -> Result<(), DriverError>;

    /// Line diff between running and candidate, `+`/`-` prefixed. Empty when equal.
    async fn compare_config(&mut self) -> Result<String, DriverError>;

    async fn commit_config(&mut self) -> Result<(), DriverError>;

    async fn discard_config(&mut self) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Opens driver sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        device: &Device,
        options: &ConnectOptions,
    ) -> Result<Box<dyn DeviceDriver>, DriverError>;
}
