//! # Getter Models
//!
//! Vendor-neutral shapes of the state retrieved from a device. Drivers fill
//! them in, the `get` task hands them back keyed by [`Getter`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity and software of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facts {
    pub hostname: String,
    pub fqdn: String,
    pub vendor: String,
    pub model: String,
    pub os_version: String,
    pub serial_number: String,
    pub uptime_secs: u64,
    pub interface_list: Vec<String>,
}

/// Operational state of one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub is_up: bool,
    pub is_enabled: bool,
    pub description: String,
    pub mac_address: String,
    pub speed_mbps: u64,
    pub mtu: u32,
}

/// Interfaces keyed by name.
pub type Interfaces = BTreeMap<String, Interface>;

/// A named piece of device state the `get` task can retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Getter {
    Facts,
    Interfaces,
}

impl Getter {
    pub const ALL: [Getter; 2] = [Getter::Facts, Getter::Interfaces];

    pub fn as_str(&self) -> &'static str {
        match self {
            Getter::Facts => "facts",
            Getter::Interfaces => "interfaces",
        }
    }
}

impl fmt::Display for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Getter {
    type Err = String;

    /// Accepts the bare name and the `get_` prefixed form ("facts", "get_facts").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("get_").unwrap_or(&lower);

        Getter::ALL
            .into_iter()
            .find(|getter| getter.as_str() == name)
            .ok_or_else(|| {
                let known: Vec<&str> = Getter::ALL.iter().map(Getter::as_str).collect();
                format!("unknown getter '{s}' (known: {})", known.join(", "))
            })
    }
}

/// Data produced by one getter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GetterData {
    Facts(Facts),
    Interfaces(Interfaces),
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
