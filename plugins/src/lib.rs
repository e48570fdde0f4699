//! # fleetr plugins
//!
//! The sub-tasks shipped with fleetr and the plan file format that chains them.
//!
//! * [`Get`]: structured state through the driver getters.
//! * [`Cli`]: raw command output.
//! * [`Configure`]: load, diff, then commit or discard a configuration.
//! * [`plan`]: a [`TaskSpec`](fleetr_core::TaskSpec) written as TOML.

pub mod cli;
pub mod configure;
pub mod get;
pub mod plan;

pub use cli::Cli;
pub use configure::Configure;
pub use get::Get;
pub use plan::{Plan, PlanError};
