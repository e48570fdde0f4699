//! # fleetr common
//!
//! Shared building blocks for every crate of the workspace:
//!
//! * **[`inventory`]**: the managed devices and how they are loaded from disk.
//! * **[`models`]**: data returned by device getters (facts, interfaces).
//! * **[`config`]**: the explicit configuration object handed to the runner.
//! * **[`error`]**: loading errors for the two files above.
//!
//! The logging macros ([`info!`], [`success!`], [`warn!`], [`error!`]) are thin
//! wrappers over `tracing` so that the binary's formatter can style them.

pub mod config;
pub mod error;
pub mod inventory;
pub mod macros;
pub mod models;
