use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building an [`Inventory`](crate::inventory::Inventory).
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("cannot read inventory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid inventory: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("device '{0}' is defined more than once")]
    DuplicateDevice(String),

    #[error("device '{device}' refers to unknown group '{group}'")]
    UnknownGroup { device: String, group: String },
}

/// Errors raised while loading a [`Config`](crate::config::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: &'static str, value: String },
}
