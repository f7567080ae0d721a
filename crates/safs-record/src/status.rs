//! Status code taxonomy
//!
//! Every record leaves dispatch with exactly one [`StatusCode`]. The sentinel
//! [`StatusCode::ScriptNotExecuted`] means no processor has claimed the record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder returned in place of an empty or missing value
pub const SAFS_NULL: &str = "<SAFS_NULL>";

/// Outcome of processing one record
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum StatusCode {
    /// Action completed with a warning
    ScriptWarning = -2,
    /// Action completed successfully
    NoScriptFailure = -1,
    /// Action failed
    GeneralScriptFailure = 0,
    /// File input/output failed
    InvalidFileIo = 2,
    /// Nobody handled the record (sentinel)
    #[default]
    ScriptNotExecuted = 4,
    /// Test failure already logged by the action
    TestFailureLogged = 5,
    /// Test success already logged by the action
    TestSuccessLogged = 6,
    /// Test warning already logged by the action
    TestWarningLogged = 7,
    /// Stop executing the current table
    ExitTableCommand = 8,
    /// Caller should ignore the return code
    IgnoreReturnCode = 16,
    /// Record has no record type field
    NoRecordTypeField = 37,
    /// Record type is not recognized
    UnrecognizedRecordType = 38,
    /// Record has the wrong number of fields
    WrongNumFields = 39,
    /// Continue at the block named in the status info
    BranchToBlockId = 256,
}

impl StatusCode {
    /// Alias of [`StatusCode::NoScriptFailure`]
    pub const OK: Self = Self::NoScriptFailure;

    /// Every defined status code, in ascending code order
    pub const ALL: [Self; 14] = [
        Self::ScriptWarning,
        Self::NoScriptFailure,
        Self::GeneralScriptFailure,
        Self::InvalidFileIo,
        Self::ScriptNotExecuted,
        Self::TestFailureLogged,
        Self::TestSuccessLogged,
        Self::TestWarningLogged,
        Self::ExitTableCommand,
        Self::IgnoreReturnCode,
        Self::NoRecordTypeField,
        Self::UnrecognizedRecordType,
        Self::WrongNumFields,
        Self::BranchToBlockId,
    ];

    /// Integer code reported to the transport
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Look up a status by integer code
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Stable upper-case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ScriptWarning => "SCRIPT_WARNING",
            Self::NoScriptFailure => "NO_SCRIPT_FAILURE",
            Self::GeneralScriptFailure => "GENERAL_SCRIPT_FAILURE",
            Self::InvalidFileIo => "INVALID_FILE_IO",
            Self::ScriptNotExecuted => "SCRIPT_NOT_EXECUTED",
            Self::TestFailureLogged => "TESTFAILURE_LOGGED",
            Self::TestSuccessLogged => "TESTSUCCESS_LOGGED",
            Self::TestWarningLogged => "TESTWARNING_LOGGED",
            Self::ExitTableCommand => "EXIT_TABLE_COMMAND",
            Self::IgnoreReturnCode => "IGNORE_RETURN_CODE",
            Self::NoRecordTypeField => "NO_RECORD_TYPE_FIELD",
            Self::UnrecognizedRecordType => "UNRECOGNIZED_RECORD_TYPE",
            Self::WrongNumFields => "WRONG_NUM_FIELDS",
            Self::BranchToBlockId => "BRANCH_TO_BLOCKID",
        }
    }

    /// Whether the status reports a failed action
    #[inline]
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::GeneralScriptFailure
                | Self::InvalidFileIo
                | Self::TestFailureLogged
                | Self::NoRecordTypeField
                | Self::UnrecognizedRecordType
                | Self::WrongNumFields
        )
    }

    /// Whether this is the "nobody handled it" sentinel
    #[inline]
    #[must_use]
    pub const fn is_not_executed(self) -> bool {
        matches!(self, Self::ScriptNotExecuted)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

/// Name of a status code, or `None` when the integer is not a defined status
#[must_use]
pub fn status_string(code: i32) -> Option<&'static str> {
    StatusCode::from_code(code).map(StatusCode::name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_status_has_a_unique_name() {
        let names: HashSet<_> = StatusCode::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), StatusCode::ALL.len());
        for status in StatusCode::ALL {
            assert_eq!(status_string(status.code()), Some(status.name()));
        }
    }

    #[test]
    fn test_undefined_codes_have_no_name() {
        for code in [-3, 1, 3, 9, 17, 36, 40, 255, 257, i32::MAX] {
            assert_eq!(status_string(code), None, "code {code}");
        }
    }

    #[test]
    fn test_ok_alias() {
        assert_eq!(StatusCode::OK, StatusCode::NoScriptFailure);
        assert_eq!(StatusCode::OK.code(), -1);
        assert_eq!(StatusCode::from_code(-1), Some(StatusCode::OK));
    }

    #[test]
    fn test_known_codes() {
        assert_eq!(StatusCode::ScriptNotExecuted.code(), 4);
        assert_eq!(StatusCode::BranchToBlockId.code(), 256);
        assert_eq!(StatusCode::ExitTableCommand.code(), 8);
        assert_eq!(StatusCode::default(), StatusCode::ScriptNotExecuted);
        assert_eq!(StatusCode::WrongNumFields.to_string(), "WRONG_NUM_FIELDS");
    }

    #[test]
    fn test_failure_classification() {
        assert!(StatusCode::GeneralScriptFailure.is_failure());
        assert!(!StatusCode::OK.is_failure());
        assert!(!StatusCode::ScriptWarning.is_failure());
        assert!(!StatusCode::BranchToBlockId.is_failure());
    }
}
