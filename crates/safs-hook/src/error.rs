//! Table runner errors

use safs_dispatch::{InitializationError, VariableError};
use std::path::PathBuf;

/// Failures that stop a table run
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Table or configuration file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::HookConfig`]
    #[error("invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The dispatcher is missing a record, a log or processors
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// Record exchange through the variable store failed
    #[error(transparent)]
    Variables(#[from] VariableError),

    /// A branch named a block the table does not define
    #[error("block '{block}' not found (branch at line {line})")]
    BlockNotFound { block: String, line: u64 },

    /// The table executed more records than allowed, most likely a loop
    #[error("step limit of {0} records reached")]
    StepLimit(usize),
}

/// Result type for table runner operations
pub type HookResult<T> = Result<T, HookError>;
