//! # Device Inventory
//!
//! The full set of managed devices, keyed by a unique name.
//!
//! An [`Inventory`] is built once (usually from a TOML file, see [`file`]) and is
//! never mutated while tasks run against it.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::InventoryError;

pub mod device;
pub mod file;

pub use device::{Credentials, Device};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    devices: BTreeMap<String, Device>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an inventory, refusing duplicate names.
    pub fn from_devices<I>(devices: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = Device>,
    {
        let mut inventory = Self::new();
        for device in devices {
            inventory.insert(device)?;
        }
        Ok(inventory)
    }

    /// Reads and resolves an inventory file.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, InventoryError> {
        let parsed: file::InventoryFile = toml::from_str(raw)?;
        Self::from_devices(parsed.resolve()?)
    }

    pub fn insert(&mut self, device: Device) -> Result<(), InventoryError> {
        if self.devices.contains_key(&device.name) {
            return Err(InventoryError::DuplicateDevice(device.name));
        }
        self.devices.insert(device.name.clone(), device);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Devices in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
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
