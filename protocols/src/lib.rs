//! # Device Protocols
//!
//! Everything that actually talks to a device lives behind two traits:
//!
//! * [`Connector`]: opens a session for a [`Device`](fleetr_common::inventory::Device).
//! * [`DeviceDriver`]: the session itself (getters, CLI, candidate configuration).
//!
//! Concrete drivers:
//! * [`simulated`]: an in-memory device, used for dry labs and tests.
//! * [`tcp_cli`]: a prompt driven CLI session over a plain TCP stream.
//!
//! [`DriverRegistry`] dispatches on the device platform.

pub mod config_tree;
pub mod driver;
pub mod registry;
pub mod simulated;
pub mod tcp_cli;

pub use driver::{ConnectOptions, Connector, DeviceDriver, DriverError, LoadMode};
pub use registry::DriverRegistry;
