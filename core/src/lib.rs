//! # fleetr core
//!
//! Selecting devices, describing work and running it across a fleet.
//!
//! * **[`selector`]**: predicates and declarative filters over an inventory.
//! * **[`task`]**: the [`SubTask`](task::SubTask) seam and [`TaskSpec`](task::TaskSpec) composition.
//! * **[`runner`]**: bounded concurrent execution, fail-fast per device.
//! * **[`result`]**: what a run produced, per device and per sub-task.
//! * **[`fleet`]**: configuration, inventory and runner bundled for one invocation.

pub mod error;
pub mod fleet;
pub mod result;
pub mod runner;
pub mod selector;
pub mod task;

pub use error::{RunError, SelectionError, TaskError};
pub use fleet::Fleet;
pub use result::{DeviceResult, Outcome, ResultSet, SubTaskResult};
pub use runner::{RunOptions, Runner};
pub use selector::{Field, FieldFilter, Filter, Selection, select, select_strict};
pub use task::{ConfigChange, Payload, SubTask, TaskContext, TaskOutput, TaskSpec};
