use serde::Serialize;
use thiserror::Error;

use fleetr_protocols::DriverError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no device matched {0}")]
    Empty(String),
}

/// Why a sub-task did not succeed. Recorded in the result set, never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum TaskError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("rejected by device: {0}")]
    Rejected(String),

    #[error("{0}")]
    Failed(String),

    #[error("sub-task panicked: {0}")]
    Panicked(String),
}

impl From<DriverError> for TaskError {
    fn from(err: DriverError) -> Self {
        match err {
            e if e.is_connection() => TaskError::Connection(e.to_string()),
            e @ DriverError::NotSupported { .. } => TaskError::Unsupported(e.to_string()),
            DriverError::ConfigRejected(reason) => TaskError::Rejected(reason),
            e => TaskError::Failed(e.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("task failed on {} device(s): {}", devices.len(), devices.join(", "))]
    Failed { devices: Vec<String> },
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
