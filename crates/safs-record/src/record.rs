//! Test record model
//!
//! A [`TestRecord`] holds one raw input line, the separator it was written
//! with, the context fields populated by the transport, and the execution
//! outcome written back by whichever processor claims the record.

use crate::error::RecordError;
use crate::status::StatusCode;
use crate::tokenizer::{self, POSSIBLE_SEPARATORS};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input record value that asks the hook to shut down
pub const SHUTDOWN_HOOK: &str = "SHUTDOWN_HOOK";

/// One record flowing through dispatch
#[derive(Debug, Clone, Default)]
pub struct TestRecord {
    /// Unique id of the executing input stream
    pub file_id: Option<String>,
    /// Name of the executing input stream
    pub filename: Option<String>,
    /// Line number within the input stream
    pub line_number: u64,
    input_record: Option<String>,
    separator: Option<String>,
    tokens: OnceCell<Vec<String>>,
    /// Test level (cycle, suite, step)
    pub test_level: Option<String>,
    /// Application map in effect
    pub app_map_name: Option<String>,
    /// Upper-cased first token, set by the dispatcher
    pub record_type: Option<String>,
    /// Command or action name, set by the claiming processor
    pub command: Option<String>,
    /// Window name from a test step record
    pub window_name: Option<String>,
    /// Window recognition string
    pub window_gui_id: Option<String>,
    /// Component name from a test step record
    pub comp_name: Option<String>,
    /// Component recognition string
    pub comp_gui_id: Option<String>,
    /// Component type used to pick a component function
    pub comp_type: Option<String>,
    /// Component class reported by the GUI layer
    pub comp_class: Option<String>,
    /// Component module reported by the GUI layer
    pub comp_module: Option<String>,
    /// Alternate component type tried after `comp_type`
    pub alt_comp_type: Option<String>,
    /// Test environment (for example `Java`, `Html`)
    pub environment: Option<String>,
    /// Log facility name
    pub fac: Option<String>,
    /// Outcome of processing
    pub status_code: StatusCode,
    /// Payload accompanying the status (result value or branch target)
    pub status_info: Option<String>,
}

impl TestRecord {
    /// Create an empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from a raw line and its separator
    #[must_use]
    pub fn from_line(input_record: impl Into<String>, separator: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.set_input_record(input_record);
        record.set_separator(separator);
        record
    }

    /// Reset every field so nothing leaks into the next record
    pub fn reinit(&mut self) {
        *self = Self::default();
    }

    /// Raw input line
    #[inline]
    #[must_use]
    pub fn input_record(&self) -> Option<&str> {
        self.input_record.as_deref()
    }

    /// Replace the raw input line; cached tokens are discarded
    pub fn set_input_record(&mut self, input_record: impl Into<String>) {
        self.input_record = Some(input_record.into());
        self.tokens = OnceCell::new();
    }

    /// Field separator
    #[inline]
    #[must_use]
    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    /// Replace the field separator; cached tokens are discarded
    pub fn set_separator(&mut self, separator: impl Into<String>) {
        self.separator = Some(separator.into());
        self.tokens = OnceCell::new();
    }

    fn tokens(&self) -> Result<&[String], RecordError> {
        let input = self
            .input_record
            .as_deref()
            .ok_or(RecordError::MissingContext("input record"))?;
        let separator = self
            .separator
            .as_deref()
            .ok_or(RecordError::MissingContext("separator"))?;
        Ok(self
            .tokens
            .get_or_init(|| tokenizer::tokenize(input, separator)))
    }

    /// Raw token `index`; token 0 is the record type
    ///
    /// # Errors
    /// [`RecordError::MissingContext`] before input and separator are set,
    /// [`RecordError::TokenOutOfRange`] past the last token.
    pub fn token(&self, index: usize) -> Result<&str, RecordError> {
        let tokens = self.tokens()?;
        tokens
            .get(index)
            .map(String::as_str)
            .ok_or(RecordError::TokenOutOfRange {
                index,
                len: tokens.len(),
            })
    }

    /// Token `index`, trimmed and stripped of one pair of enclosing quotes
    ///
    /// # Errors
    /// Same as [`TestRecord::token`].
    pub fn trimmed_unquoted_token(&self, index: usize) -> Result<&str, RecordError> {
        self.token(index).map(tokenizer::trimmed_unquoted)
    }

    /// Number of tokens in the record
    ///
    /// # Errors
    /// [`RecordError::MissingContext`] before input and separator are set.
    pub fn token_count(&self) -> Result<usize, RecordError> {
        self.tokens().map(<[String]>::len)
    }

    /// Whether tokens are currently cached
    #[inline]
    #[must_use]
    pub fn is_tokenized(&self) -> bool {
        self.tokens.get().is_some()
    }

    /// A candidate separator that differs from the one in use
    #[must_use]
    pub fn not_separator_string(&self) -> &'static str {
        POSSIBLE_SEPARATORS
            .into_iter()
            .find(|candidate| {
                !self
                    .separator
                    .as_deref()
                    .is_some_and(|sep| sep.eq_ignore_ascii_case(candidate))
            })
            .unwrap_or(":")
    }

    /// `window:component`, or `window:window` when no component is set
    #[must_use]
    pub fn win_comp_name(&self) -> Option<String> {
        let window = self.window_name.as_deref()?;
        let comp = self.comp_name.as_deref().unwrap_or(window);
        Some(format!("{window}:{comp}"))
    }

    /// Whether the record targets a component rather than its window
    #[must_use]
    pub fn target_is_component(&self) -> bool {
        match (self.window_name.as_deref(), self.comp_name.as_deref()) {
            (Some(window), Some(comp)) => !comp.eq_ignore_ascii_case(window),
            _ => false,
        }
    }

    /// Turn this record into the shutdown sentinel
    pub fn set_shutdown_data(&mut self) {
        self.set_input_record(SHUTDOWN_HOOK);
        self.set_separator("");
        self.filename = Some(String::new());
        self.line_number = 0;
        self.test_level = Some(String::new());
        self.fac = Some(String::new());
        self.app_map_name = Some(String::new());
        self.status_code = StatusCode::ScriptNotExecuted;
        self.status_info = Some(String::new());
    }

    /// Whether this record is the shutdown sentinel
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.input_record.as_deref() == Some(SHUTDOWN_HOOK)
    }

    /// Copy every field of `other` into this record
    pub fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }

    /// Set status code and info together
    pub fn set_status(&mut self, status: StatusCode, info: impl Into<String>) {
        self.status_code = status;
        self.status_info = Some(info.into());
    }

    /// Snapshot of the result fields for reporting
    #[must_use]
    pub fn outcome(&self) -> RecordOutcome {
        RecordOutcome {
            filename: self.filename.clone(),
            line_number: self.line_number,
            input_record: self.input_record.clone().unwrap_or_default(),
            record_type: self.record_type.clone(),
            command: self.command.clone(),
            status_code: self.status_code.code(),
            status_name: self.status_code.name().to_string(),
            status_info: self.status_info.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field(value: Option<&String>) -> &str {
            value.map_or("null", String::as_str)
        }
        writeln!(f, "[TestRecord:")?;
        writeln!(f, "   fileID: {}", field(self.file_id.as_ref()))?;
        writeln!(f, "   filename: {}", field(self.filename.as_ref()))?;
        writeln!(f, "   lineNumber: {}", self.line_number)?;
        writeln!(f, "   inputRecord: {}", field(self.input_record.as_ref()))?;
        writeln!(f, "   separator: {}", field(self.separator.as_ref()))?;
        writeln!(f, "   testLevel: {}", field(self.test_level.as_ref()))?;
        writeln!(f, "   appMapName: {}", field(self.app_map_name.as_ref()))?;
        writeln!(f, "   recordType: {}", field(self.record_type.as_ref()))?;
        writeln!(f, "   command: {}", field(self.command.as_ref()))?;
        writeln!(f, "   windowName: {}", field(self.window_name.as_ref()))?;
        writeln!(f, "   compName: {}", field(self.comp_name.as_ref()))?;
        writeln!(f, "   compType: {}", field(self.comp_type.as_ref()))?;
        writeln!(f, "   environment: {}", field(self.environment.as_ref()))?;
        writeln!(f, "   fac: {}", field(self.fac.as_ref()))?;
        writeln!(f, "   statusCode: {}", self.status_code.code())?;
        write!(f, "   statusInfo: {}]", field(self.status_info.as_ref()))
    }
}

/// Serializable result of one processed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Source table, if known
    pub filename: Option<String>,
    /// Line within the source table
    pub line_number: u64,
    /// Raw record
    pub input_record: String,
    /// Record type as dispatched
    pub record_type: Option<String>,
    /// Command the claiming processor interpreted
    pub command: Option<String>,
    /// Integer status code
    pub status_code: i32,
    /// Status code name
    pub status_name: String,
    /// Status info, empty when unset
    pub status_info: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn populated() -> TestRecord {
        let mut record = TestRecord::from_line("C,SetVariableValues,^a=1", ",");
        record.file_id = Some("1".into());
        record.filename = Some("cycle.cdd".into());
        record.line_number = 12;
        record.test_level = Some("STEP".into());
        record.app_map_name = Some("app.map".into());
        record.record_type = Some("C".into());
        record.command = Some("SetVariableValues".into());
        record.window_name = Some("Login".into());
        record.comp_name = Some("User".into());
        record.comp_type = Some("EditBox".into());
        record.fac = Some("fac".into());
        record.set_status(StatusCode::OK, "done");
        record
    }

    #[test]
    fn test_reinit_clears_everything() {
        let mut record = populated();
        assert_eq!(record.token(1).unwrap(), "SetVariableValues");
        assert!(record.is_tokenized());

        record.reinit();
        assert_eq!(record.input_record(), None);
        assert_eq!(record.separator(), None);
        assert_eq!(record.filename, None);
        assert_eq!(record.line_number, 0);
        assert_eq!(record.command, None);
        assert_eq!(record.window_name, None);
        assert_eq!(record.status_code, StatusCode::ScriptNotExecuted);
        assert_eq!(record.status_info, None);
        assert!(!record.is_tokenized());
        assert_eq!(
            record.token(0),
            Err(RecordError::MissingContext("input record"))
        );
    }

    #[test]
    fn test_token_access() {
        let record = TestRecord::from_line("t, Win ,\" Comp \",Click", ",");
        assert_eq!(record.token_count().unwrap(), 4);
        assert_eq!(record.token(1).unwrap(), " Win ");
        assert_eq!(record.trimmed_unquoted_token(1).unwrap(), "Win");
        assert_eq!(record.trimmed_unquoted_token(2).unwrap(), " Comp ");
        assert_eq!(
            record.token(4),
            Err(RecordError::TokenOutOfRange { index: 4, len: 4 })
        );
    }

    #[test]
    fn test_missing_separator() {
        let mut record = TestRecord::new();
        record.set_input_record("C,Delay,1");
        assert_eq!(record.token(0), Err(RecordError::MissingContext("separator")));
    }

    #[test]
    fn test_setting_input_invalidates_cache() {
        let mut record = TestRecord::from_line("A,B", ",");
        assert_eq!(record.token_count().unwrap(), 2);
        record.set_input_record("A,B,C");
        assert!(!record.is_tokenized());
        assert_eq!(record.token_count().unwrap(), 3);
        record.set_separator(";");
        assert_eq!(record.token_count().unwrap(), 1);
    }

    #[test]
    fn test_win_comp_name() {
        let mut record = TestRecord::new();
        assert_eq!(record.win_comp_name(), None);
        record.window_name = Some("Main".into());
        assert_eq!(record.win_comp_name().as_deref(), Some("Main:Main"));
        assert!(!record.target_is_component());
        record.comp_name = Some("OK".into());
        assert_eq!(record.win_comp_name().as_deref(), Some("Main:OK"));
        assert!(record.target_is_component());
    }

    #[test]
    fn test_not_separator_string() {
        let mut record = TestRecord::new();
        assert_eq!(record.not_separator_string(), "\t");
        record.set_separator("\t");
        assert_eq!(record.not_separator_string(), ",");
    }

    #[test]
    fn test_shutdown_data() {
        let mut record = populated();
        record.set_shutdown_data();
        assert!(record.is_shutdown());
        assert_eq!(record.status_code, StatusCode::ScriptNotExecuted);
        assert_eq!(record.status_info.as_deref(), Some(""));
        assert_eq!(record.filename.as_deref(), Some(""));
        assert_eq!(record.line_number, 0);
    }

    #[test]
    fn test_copy_from() {
        let source = populated();
        let mut target = TestRecord::new();
        target.copy_from(&source);
        assert_eq!(target.outcome(), source.outcome());
        assert_eq!(target.comp_type, source.comp_type);
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = populated().outcome();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status_code"], -1);
        assert_eq!(json["status_name"], "NO_SCRIPT_FAILURE");
        assert_eq!(json["status_info"], "done");
    }
}
