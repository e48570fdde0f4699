use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::{RunError, TaskError};
use crate::task::TaskOutput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success(TaskOutput),
    Failure(TaskError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn output(&self) -> Option<&TaskOutput> {
        match self {
            Outcome::Success(output) => Some(output),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TaskError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    pub fn changed(&self) -> bool {
        self.output().is_some_and(|o| o.changed)
    }
}

impl From<Result<TaskOutput, TaskError>> for Outcome {
    fn from(result: Result<TaskOutput, TaskError>) -> Self {
        match result {
            Ok(output) => Outcome::Success(output),
            Err(err) => Outcome::Failure(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTaskResult {
    pub name: String,
    pub outcome: Outcome,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

/// Outcomes of one device, in execution order. Shorter than the task spec
/// when a sub-task failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceResult {
    pub device: String,
    pub results: Vec<SubTaskResult>,
}

impl DeviceResult {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            results: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, result: SubTaskResult) {
        self.results.push(result);
    }

    pub fn failed(&self) -> bool {
        self.failure().is_some()
    }

    /// The sub-task that stopped this device, if any.
    pub fn failure(&self) -> Option<&SubTaskResult> {
        self.results.iter().find(|r| r.outcome.is_failure())
    }

    pub fn changed(&self) -> bool {
        self.results.iter().any(|r| r.outcome.changed())
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.results.iter().map(|r| &r.outcome)
    }

    pub fn get(&self, name: &str) -> Option<&SubTaskResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn elapsed(&self) -> Duration {
        self.results.iter().map(|r| r.elapsed).sum()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Everything one run produced, keyed by device name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    name: String,
    devices: BTreeMap<String, DeviceResult>,
}

impl ResultSet {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            devices: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, result: DeviceResult) {
        self.devices.insert(result.device.clone(), result);
    }

    /// Name of the task spec that produced this set.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, device: &str) -> Option<&DeviceResult> {
        self.devices.get(device)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceResult> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn failed(&self) -> bool {
        self.iter().any(DeviceResult::failed)
    }

    pub fn failed_devices(&self) -> Vec<&str> {
        self.iter()
            .filter(|r| r.failed())
            .map(|r| r.device.as_str())
            .collect()
    }

    pub fn changed_devices(&self) -> Vec<&str> {
        self.iter()
            .filter(|r| r.changed())
            .map(|r| r.device.as_str())
            .collect()
    }

    /// Turns a run with failed devices into an error.
    pub fn raise_on_error(self) -> Result<Self, RunError> {
        if !self.failed() {
            return Ok(self);
        }
        Err(RunError::Failed {
            devices: self.failed_devices().into_iter().map(String::from).collect(),
        })
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = (&'a String, &'a DeviceResult);
    type IntoIter = btree_map::Iter<'a, String, DeviceResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
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
    use crate::task::Payload;

    fn step(name: &str, outcome: Outcome) -> SubTaskResult {
        SubTaskResult {
            name: name.into(),
            outcome,
            elapsed: Duration::from_millis(12),
        }
    }

    fn sample() -> ResultSet {
        let mut ok = DeviceResult::new("rt1");
        ok.push(step(
            "configure",
            Outcome::Success(TaskOutput::new(Payload::Text("+ntp server 1.1.1.1".into())).with_changed(true)),
        ));

        let mut bad = DeviceResult::new("rt2");
        bad.push(step("cli", Outcome::Success(TaskOutput::empty())));
        bad.push(step("configure", Outcome::Failure(TaskError::Rejected("bad syntax".into()))));

        let mut set = ResultSet::new("deploy");
        set.insert(bad);
        set.insert(ok);
        set
    }

    #[test]
    fn result_set_should_track_failed_and_changed_devices() {
        let set = sample();
        assert_eq!(set.name(), "deploy");
        assert_eq!(set.len(), 2);
        assert!(set.failed());
        assert_eq!(set.failed_devices(), ["rt2"]);
        assert_eq!(set.changed_devices(), ["rt1"]);
        assert_eq!(set.get("rt2").unwrap().failure().unwrap().name, "configure");
        assert_eq!(set.get("rt2").unwrap().elapsed(), Duration::from_millis(24));
    }

    #[test]
    fn raise_on_error_should_fail_with_device_names() {
        let err = sample().raise_on_error().unwrap_err();
        assert_eq!(err, RunError::Failed { devices: vec!["rt2".into()] });

        let mut clean = ResultSet::new("noop");
        clean.insert(DeviceResult::new("rt1"));
        assert!(clean.raise_on_error().is_ok());
    }

    #[test]
    fn result_set_should_serialize_elapsed_as_millis() {
        let json = serde_json::to_value(sample()).unwrap();
        let rt2 = &json["devices"]["rt2"]["results"];
        assert_eq!(rt2[0]["elapsed_ms"], 12);
        assert_eq!(rt2[1]["outcome"]["failure"]["kind"], "rejected");
    }
}
