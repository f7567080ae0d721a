//! SAFS Record Model
//!
//! The data that flows through keyword dispatch.
//!
//! # Core Concepts
//!
//! - [`TestRecord`]: one delimited input line plus its execution outcome
//! - [`tokenize`]: separator splitting that keeps empty fields
//! - [`StatusCode`]: closed outcome taxonomy with a "not executed" sentinel
//! - [`keywords`]: record types and command names per processor family
//! - [`encode_multi_value`]: self-describing list encoding for results
//!
//! # Example
//!
//! ```rust
//! use safs_record::{StatusCode, TestRecord};
//!
//! let record = TestRecord::from_line("C, Delay, 100", ",");
//! assert_eq!(record.trimmed_unquoted_token(1).unwrap(), "Delay");
//! assert_eq!(record.status_code, StatusCode::ScriptNotExecuted);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod encoding;
mod error;
pub mod keywords;
mod record;
mod status;
mod tokenizer;

// Re-exports
pub use encoding::{decode_multi_value, encode_multi_value, unique_separator, SEPARATOR_CANDIDATES};
pub use error::RecordError;
pub use record::{RecordOutcome, TestRecord, SHUTDOWN_HOOK};
pub use status::{status_string, StatusCode, SAFS_NULL};
pub use tokenizer::{tokenize, tokenize_with_delims, trimmed_unquoted, POSSIBLE_SEPARATORS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
