//! SAFS Hook
//!
//! Local table runner for keyword-driven test tables.
//!
//! # Core Concepts
//!
//! - [`HookConfig`]: separator, hook instance name and processor settings,
//!   usually loaded from TOML
//! - [`TableRunner`]: feeds each table line through one long-lived
//!   [`safs_dispatch::ProcessRequest`], following block branches
//! - [`TableReport`]: one [`safs_record::RecordOutcome`] per executed record
//!
//! # Example
//!
//! ```rust
//! use safs_hook::{HookConfig, StopReason, TableRunner};
//!
//! let table = "\
//! C, SetVariableValueEx, count, 1
//! C, OnEqualGotoBlockID, Finish, 1, 1
//! C, SetVariableValueEx, skipped, yes
//! B, Finish
//! C, ExitTable
//! ";
//!
//! let mut runner = TableRunner::new(HookConfig::new());
//! let report = runner.run_table("demo.sdd", table).unwrap();
//! assert_eq!(report.outcomes.len(), 3);
//! assert_eq!(report.stop, StopReason::ExitTable);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod config;
mod error;
mod runner;

// Re-exports
pub use config::{HookConfig, DEFAULT_MAX_STEPS, DEFAULT_SEPARATOR};
pub use error::{HookError, HookResult};
pub use runner::{StopReason, TableReport, TableRunner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
