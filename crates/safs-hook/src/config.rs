//! Runner configuration loaded from TOML
//!
//! ```toml
//! separator = "|"
//! instance_name = "SAFS/Hook/"
//! project_directory = "/work/project"
//!
//! [processor]
//! custom_proc_instance_path = "org.acme"
//! test_domains = "Java;Html"
//! ```

use crate::error::{HookError, HookResult};
use safs_dispatch::{ProcessorConfig, DEFAULT_INSTANCE_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default field separator for table files
pub const DEFAULT_SEPARATOR: &str = ",";

/// Default cap on records executed in one run
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// Table runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Field separator of the table
    pub separator: String,
    /// Prefix of the hook-level variables
    pub instance_name: String,
    /// Directory relative file names resolve against
    pub project_directory: Option<String>,
    /// Records executed before the run is abandoned
    pub max_steps: usize,
    /// Processor settings
    pub processor: ProcessorConfig,
}

impl HookConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// [`HookError::Io`] when the file cannot be read,
    /// [`HookError::Config`] when it does not parse.
    pub fn load(path: &Path) -> HookResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| HookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| HookError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// With field separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// With project directory
    #[must_use]
    pub fn with_project_directory(mut self, dir: impl Into<String>) -> Self {
        self.project_directory = Some(dir.into());
        self
    }

    /// With step limit
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// With processor settings
    #[must_use]
    pub fn with_processor(mut self, processor: ProcessorConfig) -> Self {
        self.processor = processor;
        self
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            project_directory: None,
            max_steps: DEFAULT_MAX_STEPS,
            processor: ProcessorConfig::default(),
        }
    }
}
