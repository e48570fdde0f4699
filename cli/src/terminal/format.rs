use colored::*;

use fleetr_common::inventory::Device;
use fleetr_common::models::{Facts, GetterData, Interfaces};
use fleetr_core::{Outcome, Payload, TaskError};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn outcome_status(outcome: &Outcome) -> ColoredString {
    match outcome {
        Outcome::Success(output) if output.changed => "changed".color(colors::CHANGED).bold(),
        Outcome::Success(_) => "ok".color(colors::SUCCESS).bold(),
        Outcome::Failure(err) => error_status(err),
    }
}

fn error_status(err: &TaskError) -> ColoredString {
    format!("failed ({err})").color(colors::FAILURE).bold()
}

pub fn device_details(device: &Device) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![(String::from("Hostname"), device.hostname.normal())];
    if let Some(port) = device.port {
        details.push((String::from("Port"), port.to_string().normal()));
    }
    details.push((
        String::from("Platform"),
        device.platform.as_deref().unwrap_or("-").color(colors::ACCENT),
    ));
    if !device.groups.is_empty() {
        details.push((String::from("Groups"), device.groups.join(", ").normal()));
    }
    for (key, value) in &device.data {
        details.push((format!("data.{key}"), value.as_str().dimmed()));
    }
    details
}

pub fn facts_details(facts: &Facts) -> Vec<Detail> {
    vec![
        (String::from("Hostname"), facts.hostname.as_str().color(colors::PRIMARY)),
        (String::from("FQDN"), facts.fqdn.as_str().normal()),
        (
            String::from("Model"),
            format!("{} {}", facts.vendor, facts.model).normal(),
        ),
        (String::from("OS"), facts.os_version.as_str().normal()),
        (String::from("Serial"), facts.serial_number.as_str().normal()),
        (String::from("Uptime"), format!("{}s", facts.uptime_secs).normal()),
        (
            String::from("Interfaces"),
            facts.interface_list.len().to_string().color(colors::ACCENT),
        ),
    ]
}

pub fn interface_details(interfaces: &Interfaces) -> Vec<Detail> {
    interfaces
        .iter()
        .map(|(name, intf)| {
            let state: ColoredString = match (intf.is_enabled, intf.is_up) {
                (false, _) => "admin down".color(colors::FAILURE),
                (true, false) => "down".color(colors::CHANGED),
                (true, true) => "up".color(colors::SUCCESS),
            };
            let mut value = format!("{state} mtu {} {}Mb/s {}", intf.mtu, intf.speed_mbps, intf.mac_address);
            if !intf.description.is_empty() {
                value.push_str(&format!(" \"{}\"", intf.description));
            }
            (name.clone(), value.normal())
        })
        .collect()
}

pub fn diff_lines(diff: &str) -> Vec<ColoredString> {
    diff.lines()
        .map(|line| match line.chars().next() {
            Some('+') => line.color(colors::DIFF_ADD),
            Some('-') => line.color(colors::DIFF_REMOVE),
            _ => line.color(colors::DIFF_CONTEXT),
        })
        .collect()
}

/// Renders a payload as the lines hanging below its sub-task.
pub fn payload_lines(payload: &Payload) -> Vec<ColoredString> {
    match payload {
        Payload::Getters(data) => data
            .iter()
            .flat_map(|(getter, value)| {
                let details = match value {
                    GetterData::Facts(facts) => facts_details(facts),
                    GetterData::Interfaces(interfaces) => interface_details(interfaces),
                };
                std::iter::once(format!("{getter}").bold())
                    .chain(details.into_iter().map(|(k, v)| format!("  {k}: {v}").normal()))
            })
            .collect(),
        Payload::Cli(outputs) => outputs
            .iter()
            .flat_map(|(command, output)| {
                std::iter::once(format!("$ {command}").color(colors::ACCENT))
                    .chain(output.lines().map(|l| format!("  {l}").normal()))
            })
            .collect(),
        Payload::Config(change) if change.diff.is_empty() => {
            vec!["no differences".dimmed()]
        }
        Payload::Config(change) => {
            let mut lines = diff_lines(&change.diff);
            let note = if change.committed { "committed" } else { "not committed (dry run)" };
            lines.push(note.italic());
            lines
        }
        Payload::Text(text) => text.lines().map(|l| l.normal()).collect(),
        Payload::Empty => Vec::new(),
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
