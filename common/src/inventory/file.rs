//! On-disk inventory format.
//!
//! ```toml
//! [defaults]
//! platform = "simulated"
//! username = "admin"
//!
//! [groups.core]
//! data = { role = "core" }
//!
//! [hosts.rt1]
//! hostname = "10.0.0.1"
//! groups = ["core"]
//! ```
//!
//! Attribute precedence: host, then its groups in the order listed (each group
//! followed by its own parent groups), then `[defaults]`. `data` tables merge
//! with the same precedence.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::error::InventoryError;
use crate::inventory::device::{Credentials, Device};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryFile {
    #[serde(default)]
    pub defaults: Attributes,
    #[serde(default)]
    pub groups: BTreeMap<String, Attributes>,
    #[serde(default)]
    pub hosts: BTreeMap<String, Attributes>,
}

/// Attributes shared by hosts, groups and defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attributes {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub platform: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub data: BTreeMap<String, toml::Value>,
}

impl InventoryFile {
    /// Flattens every host with its groups and defaults into a [`Device`].
    pub fn resolve(&self) -> Result<Vec<Device>, InventoryError> {
        self.hosts
            .iter()
            .map(|(name, host)| self.resolve_host(name, host))
            .collect()
    }

    fn resolve_host(&self, name: &str, host: &Attributes) -> Result<Device, InventoryError> {
        let group_names = self.expand_groups(name, &host.groups)?;

        let mut chain: Vec<&Attributes> = Vec::with_capacity(group_names.len() + 2);
        chain.push(host);
        for group in &group_names {
            if let Some(attrs) = self.groups.get(group) {
                chain.push(attrs);
            }
        }
        chain.push(&self.defaults);

        let pick = |field: fn(&Attributes) -> Option<&String>| -> Option<String> {
            chain.iter().find_map(|attrs| field(attrs)).cloned()
        };

        let mut data: BTreeMap<String, String> = BTreeMap::new();
        for attrs in chain.iter().rev() {
            for (key, value) in &attrs.data {
                data.insert(key.clone(), value_to_string(value));
            }
        }

        Ok(Device {
            name: name.to_string(),
            hostname: pick(|a| a.hostname.as_ref()).unwrap_or_else(|| name.to_string()),
            port: chain.iter().find_map(|attrs| attrs.port),
            platform: pick(|a| a.platform.as_ref()),
            credentials: Credentials {
                username: pick(|a| a.username.as_ref()),
                password: pick(|a| a.password.as_ref()),
            },
            groups: group_names,
            data,
        })
    }

    /// Depth-first expansion of group memberships, de-duplicated, cycle safe.
    fn expand_groups(&self, device: &str, direct: &[String]) -> Result<Vec<String>, InventoryError> {
        let mut ordered: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack: Vec<&String> = direct.iter().rev().collect();

        while let Some(group) = stack.pop() {
            if !seen.insert(group.clone()) {
                continue;
            }
            let attrs = self.groups.get(group).ok_or_else(|| InventoryError::UnknownGroup {
                device: device.to_string(),
                group: group.clone(),
            })?;
            ordered.push(group.clone());
            stack.extend(attrs.groups.iter().rev());
        }

        Ok(ordered)
    }
}

fn value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
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
    use crate::error::InventoryError;
    use crate::inventory::Inventory;

    const LAB: &str = r#"
        [defaults]
        platform = "simulated"
        username = "admin"
        password = "admin"
        data = { site = "lab", tier = "3" }

        [groups.core]
        platform = "cli"
        groups = ["routers"]
        data = { role = "core" }

        [groups.routers]
        port = 2222
        data = { role = "router", tier = "1" }

        [hosts.rt1]
        hostname = "10.0.0.1"
        groups = ["core"]
        data = { asn = 65001 }

        [hosts.rt2]
        password = "other"
    "#;

    #[test]
    fn resolve_should_apply_host_group_default_precedence() {
        let inventory = Inventory::from_toml_str(LAB).unwrap();
        let rt1 = inventory.get("rt1").unwrap();

        assert_eq!(rt1.hostname, "10.0.0.1");
        assert_eq!(rt1.platform.as_deref(), Some("cli"));
        assert_eq!(rt1.port, Some(2222));
        assert_eq!(rt1.groups, ["core", "routers"]);
        assert_eq!(rt1.credentials.username.as_deref(), Some("admin"));
        assert_eq!(rt1.data("role"), Some("core"));
        assert_eq!(rt1.data("tier"), Some("1"));
        assert_eq!(rt1.data("site"), Some("lab"));
        assert_eq!(rt1.data("asn"), Some("65001"));
    }

    #[test]
    fn resolve_should_fall_back_to_defaults_without_groups() {
        let inventory = Inventory::from_toml_str(LAB).unwrap();
        let rt2 = inventory.get("rt2").unwrap();

        assert_eq!(rt2.hostname, "rt2");
        assert_eq!(rt2.platform.as_deref(), Some("simulated"));
        assert_eq!(rt2.port, None);
        assert_eq!(rt2.credentials.password.as_deref(), Some("other"));
        assert!(rt2.groups.is_empty());
    }

    #[test]
    fn resolve_should_reject_unknown_group() {
        let err = Inventory::from_toml_str("[hosts.rt1]\ngroups = [\"edge\"]").unwrap_err();
        assert!(matches!(
            err,
            InventoryError::UnknownGroup { ref device, ref group } if device == "rt1" && group == "edge"
        ));
    }

    #[test]
    fn resolve_should_survive_group_cycles() {
        let raw = r#"
            [groups.a]
            groups = ["b"]
            [groups.b]
            groups = ["a"]
            [hosts.rt1]
            groups = ["a"]
        "#;
        let inventory = Inventory::from_toml_str(raw).unwrap();
        assert_eq!(inventory.get("rt1").unwrap().groups, ["a", "b"]);
    }

    #[test]
    fn parse_should_reject_unknown_fields() {
        let err = Inventory::from_toml_str("[hosts.rt1]\nplatfrom = \"cli\"").unwrap_err();
        assert!(matches!(err, InventoryError::Parse(_)));
    }
}
