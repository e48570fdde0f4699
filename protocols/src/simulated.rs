//! A **simulated** network device.
//!
//! The connector keeps one running configuration per device name for its whole
//! lifetime, so changes committed in one session are visible to the next.
//! Facts are derived from inventory `data` (`vendor`, `model`, `os_version`,
//! `serial_number`, `domain`, `interfaces`) and from the running configuration.
//!
//! Setting `data.unreachable = "true"` on a device makes every connection fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use fleetr_common::inventory::Device;
use fleetr_common::models::{Facts, Interface, Interfaces};

use crate::config_tree::{self, ConfigTree};
use crate::driver::{ConnectOptions, Connector, DeviceDriver, DriverError, LoadMode};
use crate::registry::SIMULATED_PLATFORM;

pub const INVALID_INPUT: &str = "% Invalid input detected at '^' marker.";

const DEFAULT_INTERFACES: &[&str] = &["GigabitEthernet0/0", "GigabitEthernet0/1", "Loopback0"];

/// First words the simulated parser accepts in configuration mode.
const CONFIG_KEYWORDS: &[&str] = &[
    "banner", "description", "hostname", "interface", "ip", "ipv6", "line", "logging", "mtu",
    "name", "neighbor", "network", "ntp", "router", "service", "shutdown", "snmp-server",
    "spanning-tree", "switchport", "username", "vlan",
];

type RunningConfigs = Arc<Mutex<HashMap<String, ConfigTree>>>;

#[derive(Clone)]
pub struct SimulatedConnector {
    running: RunningConfigs,
    booted: Instant,
}

impl SimulatedConnector {
    pub fn new() -> Self {
        Self {
            running: Arc::new(Mutex::new(HashMap::new())),
            booted: Instant::now(),
        }
    }

    /// Running configuration of a device that has been connected at least once.
    pub fn running_config(&self, device: &str) -> Option<ConfigTree> {
        lock(&self.running).get(device).cloned()
    }
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for SimulatedConnector {
    async fn connect(
        &self,
        device: &Device,
        _options: &ConnectOptions,
    ) -> Result<Box<dyn DeviceDriver>, DriverError> {
        if device.data("unreachable") == Some("true") {
            return Err(DriverError::Connect {
                host: device.hostname.clone(),
                reason: "host unreachable".to_string(),
            });
        }

        lock(&self.running)
            .entry(device.name.clone())
            .or_insert_with(|| initial_config(device));

        Ok(Box::new(SimulatedDriver {
            device: device.clone(),
            running: self.running.clone(),
            booted: self.booted,
            candidate: None,
            closed: false,
        }))
    }
}

pub struct SimulatedDriver {
    device: Device,
    running: RunningConfigs,
    booted: Instant,
    candidate: Option<ConfigTree>,
    closed: bool,
}

impl SimulatedDriver {
    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        Ok(())
    }

    fn running(&self) -> ConfigTree {
        lock(&self.running)
            .get(&self.device.name)
            .cloned()
            .unwrap_or_default()
    }

    fn hostname(&self, running: &ConfigTree) -> String {
        running
            .value("hostname")
            .map(str::to_string)
            .unwrap_or_else(|| self.device.name.clone())
    }

    fn facts(&self) -> Facts {
        let running = self.running();
        let hostname = self.hostname(&running);
        let data = |key: &str, fallback: &str| self.device.data(key).unwrap_or(fallback).to_string();

        Facts {
            fqdn: format!("{hostname}.{}", data("domain", "local")),
            hostname,
            vendor: data("vendor", "Simulated"),
            model: data("model", "vRouter"),
            os_version: data("os_version", "1.0"),
            serial_number: data(
                "serial_number",
                &format!("SIM{}", self.device.name.to_ascii_uppercase()),
            ),
            uptime_secs: self.booted.elapsed().as_secs(),
            interface_list: interfaces_of(&running).keys().cloned().collect(),
        }
    }

    fn show(&self, command: &str) -> String {
        let running = self.running();
        let normalized: Vec<String> = command
            .split_whitespace()
            .map(str::to_ascii_lowercase)
            .collect();
        let words: Vec<&str> = normalized.iter().map(String::as_str).collect();

        match words.as_slice() {
            ["show", "running-config"] | ["show", "run"] => running.to_string(),
            ["show", "hostname"] => self.hostname(&running),
            ["show", "version"] => {
                let facts = self.facts();
                format!(
                    "{} {} Software, Version {}\n{} uptime is {} seconds\nProcessor board ID {}",
                    facts.vendor,
                    facts.model,
                    facts.os_version,
                    facts.hostname,
                    facts.uptime_secs,
                    facts.serial_number
                )
            }
            ["show", "interfaces", "brief" | "summary"] | ["show", "ip", "interface", "brief"] => {
                interface_table(&interfaces_of(&running))
            }
            _ => INVALID_INPUT.to_string(),
        }
    }
}

#[async_trait]
impl DeviceDriver for SimulatedDriver {
    fn platform(&self) -> &str {
        SIMULATED_PLATFORM
    }

    async fn get_facts(&mut self) -> Result<Facts, DriverError> {
        self.ensure_open()?;
        Ok(self.facts())
    }

    async fn get_interfaces(&mut self) -> Result<Interfaces, DriverError> {
        self.ensure_open()?;
        Ok(interfaces_of(&self.running()))
    }

    async fn cli(&mut self, command: &str) -> Result<String, DriverError> {
        self.ensure_open()?;
        Ok(self.show(command))
    }

    async fn load_candidate(&mut self, config: &str, mode: LoadMode) -> Result<(), DriverError> {
        self.ensure_open()?;
        validate(config)?;

        let change = ConfigTree::parse(config);
        let mut candidate = match mode {
            LoadMode::Merge => self.running(),
            LoadMode::Replace => ConfigTree::default(),
        };
        candidate.merge(&change);
        self.candidate = Some(candidate);
        Ok(())
    }

    async fn compare_config(&mut self) -> Result<String, DriverError> {
        self.ensure_open()?;
        Ok(self
            .candidate
            .as_ref()
            .map(|candidate| self.running().diff(candidate))
            .unwrap_or_default())
    }

    async fn commit_config(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        let candidate = self.candidate.take().ok_or(DriverError::NoCandidate)?;
        debug!(device = %self.device.name, "committing candidate");
        lock(&self.running).insert(self.device.name.clone(), candidate);
        Ok(())
    }

    async fn discard_config(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.candidate = None;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.candidate = None;
        self.closed = true;
        Ok(())
    }
}

fn lock(running: &RunningConfigs) -> MutexGuard<'_, HashMap<String, ConfigTree>> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}

fn initial_config(device: &Device) -> ConfigTree {
    let interfaces: Vec<String> = match device.data("interfaces") {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect(),
        None => DEFAULT_INTERFACES.iter().map(|s| s.to_string()).collect(),
    };

    let mut lines = vec![format!("hostname {}", device.name)];
    lines.extend(interfaces.iter().map(|name| format!("interface {name}")));
    ConfigTree::parse(&lines.join("\n"))
}

fn validate(config: &str) -> Result<(), DriverError> {
    for line in config.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('!') || line == "exit" || line == "end" {
            continue;
        }
        let keyword = match config_tree::first_keyword(line) {
            "no" => line.split_whitespace().nth(1).unwrap_or(""),
            keyword => keyword,
        };
        if !CONFIG_KEYWORDS.contains(&keyword) {
            return Err(DriverError::ConfigRejected(format!("{INVALID_INPUT} '{line}'")));
        }
    }
    Ok(())
}

fn interfaces_of(running: &ConfigTree) -> Interfaces {
    running
        .sections_starting_with("interface")
        .filter_map(|section| {
            let name = section.header.strip_prefix("interface")?.trim().to_string();
            let is_enabled = !section.has_child("shutdown");
            let interface = Interface {
                is_up: is_enabled,
                is_enabled,
                description: section.child_value("description").unwrap_or("").to_string(),
                mac_address: mac_for(&name),
                speed_mbps: speed_for(&name),
                mtu: section
                    .child_value("mtu")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1500),
            };
            Some((name, interface))
        })
        .collect()
}

fn interface_table(interfaces: &Interfaces) -> String {
    let mut rows = vec![format!("{:<24} {:<8} {}", "Interface", "Status", "Description")];
    for (name, intf) in interfaces {
        let status = if intf.is_up { "up" } else { "down" };
        rows.push(format!("{name:<24} {status:<8} {}", intf.description));
    }
    rows.join("\n")
}

fn speed_for(name: &str) -> u64 {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("loopback") {
        0
    } else if lower.starts_with("tengig") {
        10_000
    } else {
        1_000
    }
}

/// Locally administered MAC derived from the interface name (FNV-1a).
fn mac_for(name: &str) -> String {
    let hash = name
        .bytes()
        .fold(0x811c_9dc5_u32, |acc, b| (acc ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let [a, b, c, d] = hash.to_be_bytes();
    format!("02:00:{a:02x}:{b:02x}:{c:02x}:{d:02x}")
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

    fn rt1() -> Device {
        Device::new("rt1")
            .with_platform("simulated")
            .with_data("vendor", "Cisco")
    }

    async fn open(connector: &SimulatedConnector, device: &Device) -> Box<dyn DeviceDriver> {
        connector
            .connect(device, &ConnectOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn connect_should_fail_for_unreachable_device() {
        let connector = SimulatedConnector::new();
        let device = rt1().with_data("unreachable", "true");
        let err = connector
            .connect(&device, &ConnectOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DriverError::Connect { .. }));
    }

    #[tokio::test]
    async fn get_facts_should_reflect_inventory_and_config() {
        let connector = SimulatedConnector::new();
        let mut driver = open(&connector, &rt1()).await;

        let facts = driver.get_facts().await.unwrap();
        assert_eq!(facts.hostname, "rt1");
        assert_eq!(facts.fqdn, "rt1.local");
        assert_eq!(facts.vendor, "Cisco");
        assert_eq!(facts.interface_list.len(), 3);
    }

    #[tokio::test]
    async fn cli_should_answer_unknown_commands_with_invalid_input() {
        let connector = SimulatedConnector::new();
        let mut driver = open(&connector, &rt1()).await;

        assert_eq!(driver.cli("show x").await.unwrap(), INVALID_INPUT);
        assert_eq!(driver.cli("show   HOSTNAME").await.unwrap(), "rt1");
        assert!(driver.cli("show interfaces brief").await.unwrap().contains("Loopback0"));
    }

    #[tokio::test]
    async fn load_candidate_should_reject_unknown_keywords() {
        let connector = SimulatedConnector::new();
        let mut driver = open(&connector, &rt1()).await;

        let err = driver
            .load_candidate("bad syntax", LoadMode::Merge)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad syntax"), "{err}");
        assert_eq!(driver.compare_config().await.unwrap(), "");
    }

    #[tokio::test]
    async fn commit_should_persist_across_sessions() {
        let connector = SimulatedConnector::new();
        let mut driver = open(&connector, &rt1()).await;

        driver
            .load_candidate("interface loopback 1000", LoadMode::Merge)
            .await
            .unwrap();
        assert_eq!(
            driver.compare_config().await.unwrap(),
            "+interface loopback 1000"
        );
        driver.commit_config().await.unwrap();
        driver.close().await.unwrap();

        let mut again = open(&connector, &rt1()).await;
        let interfaces = again.get_interfaces().await.unwrap();
        assert!(interfaces.contains_key("loopback 1000"));
        assert!(
            connector
                .running_config("rt1")
                .unwrap()
                .section("interface loopback 1000")
                .is_some()
        );
    }

    #[tokio::test]
    async fn discard_should_leave_running_config_untouched() {
        let connector = SimulatedConnector::new();
        let mut driver = open(&connector, &rt1()).await;
        let before = connector.running_config("rt1").unwrap();

        driver
            .load_candidate("interface GigabitEthernet0/0\n shutdown", LoadMode::Merge)
            .await
            .unwrap();
        driver.discard_config().await.unwrap();

        assert_eq!(connector.running_config("rt1").unwrap(), before);
        assert!(matches!(
            driver.commit_config().await.unwrap_err(),
            DriverError::NoCandidate
        ));
    }

    #[tokio::test]
    async fn replace_should_drop_unlisted_sections() {
        let connector = SimulatedConnector::new();
        let mut driver = open(&connector, &rt1()).await;

        driver
            .load_candidate("hostname core1\ninterface Loopback0", LoadMode::Replace)
            .await
            .unwrap();
        let diff = driver.compare_config().await.unwrap();
        assert!(diff.contains("-interface GigabitEthernet0/0"), "{diff}");
        assert!(diff.contains("+hostname core1"), "{diff}");

        driver.commit_config().await.unwrap();
        assert_eq!(driver.get_facts().await.unwrap().hostname, "core1");
    }

    #[tokio::test]
    async fn closed_session_should_refuse_work() {
        let connector = SimulatedConnector::new();
        let mut driver = open(&connector, &rt1()).await;
        driver.close().await.unwrap();
        assert!(matches!(
            driver.cli("show version").await.unwrap_err(),
            DriverError::Closed
        ));
    }

    #[test]
    fn interfaces_of_should_read_shutdown_description_and_mtu() {
        let running = ConfigTree::parse(
            "interface Gi0/0\n description uplink\n shutdown\n mtu 9000\ninterface Loopback0",
        );
        let interfaces = interfaces_of(&running);

        let gi = &interfaces["Gi0/0"];
        assert!(!gi.is_enabled);
        assert_eq!(gi.description, "uplink");
        assert_eq!(gi.mtu, 9000);
        assert_eq!(interfaces["Loopback0"].speed_mbps, 0);
        assert_eq!(mac_for("Gi0/0"), mac_for("Gi0/0"));
    }
}
