//! Choosing the devices a task runs against.
//!
//! [`select`] takes any predicate; [`Filter`] is the declarative form the CLI
//! builds from `field=value[,value]` arguments. Both produce a [`Selection`],
//! a borrowed view into the inventory.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use fleetr_common::inventory::{Device, Inventory};

use crate::error::SelectionError;

/// Devices picked out of an inventory, ordered by name.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    devices: BTreeMap<&'a str, &'a Device>,
    criteria: String,
}

impl<'a> Selection<'a> {
    fn collect_from<I>(devices: I, criteria: String) -> Self
    where
        I: IntoIterator<Item = &'a Device>,
    {
        Self {
            devices: devices.into_iter().map(|d| (d.name.as_str(), d)).collect(),
            criteria,
        }
    }

    /// Narrows the selection further.
    pub fn filter<P>(self, predicate: P) -> Selection<'a>
    where
        P: Fn(&Device) -> bool,
    {
        let criteria = self.criteria.clone();
        Self::collect_from(self.devices.into_values().filter(|d| predicate(d)), criteria)
    }

    /// Narrows the selection with a declarative filter.
    pub fn filter_by(self, filter: &Filter) -> Selection<'a> {
        let criteria = if filter.is_empty() {
            self.criteria.clone()
        } else {
            format!("{} and {filter}", self.criteria)
        };
        Self::collect_from(
            self.devices.into_values().filter(|d| filter.matches(d)),
            criteria,
        )
    }

    pub fn require_non_empty(self) -> Result<Self, SelectionError> {
        if self.is_empty() {
            return Err(SelectionError::Empty(self.criteria));
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&'a Device> {
        self.devices.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.devices.keys().copied()
    }

    pub fn devices(&self) -> impl Iterator<Item = &'a Device> + '_ {
        self.devices.values().copied()
    }

    /// Human readable description of how the devices were chosen.
    pub fn criteria(&self) -> &str {
        &self.criteria
    }
}

/// Every device of `inventory` satisfying `predicate`.
pub fn select<'a, P>(inventory: &'a Inventory, predicate: P) -> Selection<'a>
where
    P: Fn(&Device) -> bool,
{
    Selection::collect_from(
        inventory.iter().filter(|d| predicate(d)),
        "the given predicate".to_string(),
    )
}

/// Like [`select`], but an empty result is an error.
pub fn select_strict<'a, P>(inventory: &'a Inventory, predicate: P) -> Result<Selection<'a>, SelectionError>
where
    P: Fn(&Device) -> bool,
{
    select(inventory, predicate).require_non_empty()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Name,
    Hostname,
    Platform,
    Group,
    Data(String),
}

impl Field {
    fn parse(key: &str) -> Self {
        match key {
            "name" => Field::Name,
            "hostname" => Field::Hostname,
            "platform" => Field::Platform,
            "group" | "groups" => Field::Group,
            other => Field::Data(other.strip_prefix("data.").unwrap_or(other).to_string()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => f.write_str("name"),
            Field::Hostname => f.write_str("hostname"),
            Field::Platform => f.write_str("platform"),
            Field::Group => f.write_str("group"),
            Field::Data(key) => write!(f, "data.{key}"),
        }
    }
}

/// `field=value[,value…]`: true when the field equals any of the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: Field,
    pub values: Vec<String>,
}

impl FieldFilter {
    pub fn matches(&self, device: &Device) -> bool {
        let wanted = |value: &str| self.values.iter().any(|v| v == value);
        match &self.field {
            Field::Name => wanted(&device.name),
            Field::Hostname => wanted(&device.hostname),
            Field::Platform => device.platform.as_deref().is_some_and(wanted),
            Field::Group => device.groups.iter().any(|g| wanted(g)),
            Field::Data(key) => device.data(key).is_some_and(wanted),
        }
    }
}

impl FromStr for FieldFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, values) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE[,VALUE], got '{s}'"))?;

        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing field name in '{s}'"));
        }

        let values: Vec<String> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        if values.is_empty() {
            return Err(format!("missing value in '{s}'"));
        }

        Ok(Self {
            field: Field::parse(&key.to_ascii_lowercase()),
            values,
        })
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.values.join(","))
    }
}

/// Conjunction of field filters. An empty filter matches every device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    filters: Vec<FieldFilter>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, device: &Device) -> bool {
        self.filters.iter().all(|f| f.matches(device))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn select<'a>(&self, inventory: &'a Inventory) -> Selection<'a> {
        Selection::collect_from(inventory.iter().filter(|d| self.matches(d)), self.to_string())
    }
}

impl From<Vec<FieldFilter>> for Filter {
    fn from(filters: Vec<FieldFilter>) -> Self {
        Self { filters }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filters.is_empty() {
            return f.write_str("all devices");
        }
        let parts: Vec<String> = self.filters.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" and "))
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
