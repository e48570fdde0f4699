//! # Run Configuration
//!
//! The explicit configuration object built once by the caller and handed to the
//! selector and the runner. Nothing here is process-global.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults,
//! 2. a TOML file (`fleetr.toml` in the working directory when no path is given),
//! 3. `FLEETR_*` environment variables,
//! 4. command line flags (applied by the binary).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "fleetr.toml";

const ENV_DRY_RUN: &str = "FLEETR_DRY_RUN";
const ENV_NUM_WORKERS: &str = "FLEETR_NUM_WORKERS";
const ENV_INVENTORY: &str = "FLEETR_INVENTORY";
const ENV_LOG: &str = "FLEETR_LOG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default for configuration tasks that do not decide for themselves.
    ///
    /// A dry run computes and reports the diff, then discards the candidate.
    pub dry_run: bool,
    /// Turns a run with failed devices into an error once results are presented.
    pub raise_on_error: bool,
    pub inventory: InventoryConfig,
    pub runner: RunnerConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub path: PathBuf,
    /// Platform used for devices that do not name one.
    pub default_platform: Option<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("inventory.toml"),
            default_platform: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Upper bound on devices worked on at the same time. `1` is a sequential sweep.
    pub num_workers: usize,
    pub connect_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            num_workers: 20,
            connect_timeout_ms: 10_000,
            command_timeout_ms: 30_000,
        }
    }
}

impl RunnerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "fleetr_core=debug". `RUST_LOG` wins over it.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 0 prints everything, 1 drops headers, 2 only keeps the summary.
    pub quiet: u8,
    pub no_banner: bool,
}

impl Config {
    /// Reads a config file. Relative inventory paths are resolved against the
    /// directory holding the file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: Config = toml::from_str(&raw)?;

        if cfg.inventory.path.is_relative()
            && let Some(dir) = path.parent()
        {
            cfg.inventory.path = dir.join(&cfg.inventory.path);
        }

        Ok(cfg)
    }

    /// Loads `path` when given, otherwise `./fleetr.toml` when it exists, otherwise
    /// the defaults. Environment overrides are applied in every case.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let local = Path::new(DEFAULT_CONFIG_FILE);
        let mut cfg = match path {
            Some(path) => Self::load(path)?,
            None if local.exists() => Self::load(local)?,
            None => Self::default(),
        };

        cfg.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(cfg)
    }

    /// Applies `FLEETR_*` overrides read through `lookup`. Blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = read(ENV_DRY_RUN) {
            self.dry_run = parse_bool(&v).ok_or(ConfigError::InvalidEnv {
                var: ENV_DRY_RUN,
                value: v.clone(),
            })?;
        }
        if let Some(v) = read(ENV_NUM_WORKERS) {
            self.runner.num_workers = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidEnv {
                    var: ENV_NUM_WORKERS,
                    value: v.clone(),
                })?;
        }
        if let Some(v) = read(ENV_INVENTORY) {
            self.inventory.path = PathBuf::from(v.trim());
        }
        if let Some(v) = read(ENV_LOG) {
            self.logging.level = v.trim().to_string();
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
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
