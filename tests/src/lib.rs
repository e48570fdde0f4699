//! Cross-crate scenarios: inventory, selector, runner, plugins and the
//! simulated driver working together.

pub mod fixtures;

#[cfg(test)]
mod fleet;
