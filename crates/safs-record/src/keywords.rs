//! Record types and command names
//!
//! Command names are matched case-insensitively by the processors; the
//! spellings here are the canonical ones used in test tables.

/// Driver command record
pub const DRIVER_COMMAND: &str = "C";
/// Driver command that logs a warning on failure
pub const DRIVER_COMMAND_WARNING: &str = "CW";
/// Driver command that logs a failure
pub const DRIVER_COMMAND_FAILURE: &str = "CF";
/// Test step (component function) record
pub const TEST_STEP: &str = "T";
/// Test step that logs a warning on failure
pub const TEST_STEP_WARNING: &str = "TW";
/// Test step that logs a failure
pub const TEST_STEP_FAILURE: &str = "TF";
/// Engine command record
pub const ENGINE_COMMAND: &str = "E";
/// Block id label
pub const BLOCK_ID: &str = "B";
/// Breakpoint record
pub const BREAKPOINT: &str = "BP";
/// Skipped record
pub const SKIPPED: &str = "S";

/// Variable receiving the status code of the last driver command or test step
pub const CUSTOM_STATUS_CODE_VARIABLE: &str = "customStatusCode";

fn is_any(record_type: &str, candidates: &[&str]) -> bool {
    let record_type = record_type.trim();
    candidates
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(record_type))
}

/// `C`, `CW` or `CF`
#[must_use]
pub fn is_driver_command_record(record_type: &str) -> bool {
    is_any(
        record_type,
        &[DRIVER_COMMAND, DRIVER_COMMAND_WARNING, DRIVER_COMMAND_FAILURE],
    )
}

/// `T`, `TW` or `TF`
#[must_use]
pub fn is_test_step_record(record_type: &str) -> bool {
    is_any(record_type, &[TEST_STEP, TEST_STEP_WARNING, TEST_STEP_FAILURE])
}

/// `E`
#[must_use]
pub fn is_engine_command_record(record_type: &str) -> bool {
    is_any(record_type, &[ENGINE_COMMAND])
}

/// `B`
#[must_use]
pub fn is_block_id_record(record_type: &str) -> bool {
    is_any(record_type, &[BLOCK_ID])
}

/// File system driver commands
pub mod file {
    #![allow(missing_docs)]

    pub const COPY_FILE: &str = "CopyFile";
    pub const CREATE_DIRECTORY: &str = "CreateDirectory";
    pub const CREATE_FILE: &str = "CreateFile";
    pub const DELETE_DIRECTORY: &str = "DeleteDirectory";
    pub const DELETE_DIRECTORY_CONTENTS: &str = "DeleteDirectoryContents";
    pub const DELETE_FILE: &str = "DeleteFile";
    pub const GET_FILE_SIZE: &str = "GetFileSize";
    pub const GET_FILES: &str = "GetFiles";
    pub const IF_EXIST_DIR: &str = "IfExistDir";
    pub const IF_EXIST_FILE: &str = "IfExistFile";
    pub const PRINT_TO_FILE: &str = "PrintToFile";
    pub const READ_FILE_STRING: &str = "ReadFileString";
    pub const RENAME_FILE: &str = "RenameFile";
}

/// Miscellaneous driver commands
pub mod misc {
    #![allow(missing_docs)]

    pub const DELAY: &str = "Delay";
    pub const PAUSE: &str = "Pause";
    pub const BP: &str = "BP";
    pub const BREAKPOINTS: &str = "Breakpoints";
    pub const COMMAND_DEBUG: &str = "CommandDebug";
    pub const TEST_DEBUG: &str = "TestDebug";
    pub const GET_SYSTEM_DATE: &str = "GetSystemDate";
    pub const GET_SYSTEM_DATE_TIME: &str = "GetSystemDateTime";
    pub const GET_SYSTEM_TIME: &str = "GetSystemTime";
    pub const SET_VARIABLE_VALUES: &str = "SetVariableValues";
    pub const SET_VARIABLE_VALUE_EX: &str = "SetVariableValueEx";
    pub const COPY_VARIABLE_VALUE_EX: &str = "CopyVariableValueEx";
    pub const CLEAR_ALL_VARIABLES: &str = "ClearAllVariables";
    pub const SET_PROJECT_DIRECTORY: &str = "SetProjectDirectory";
    pub const SET_TEST_DIRECTORY: &str = "SetTestDirectory";
    pub const SET_BENCH_DIRECTORY: &str = "SetBenchDirectory";
    pub const GET_VERSION: &str = "GetVersion";
}

/// Database driver commands
pub mod database {
    #![allow(missing_docs)]

    pub const SET_JDBC_DRIVER: &str = "SetJdbcDriver";
    pub const EXEC_SQL_QUERY: &str = "ExecSQLQuery";
    pub const GET_DB_VALUE: &str = "GetDBValue";
    pub const VERIFY_DB_VALUE: &str = "VerifyDBValue";
    pub const GET_DB_TABLE_ROW_COUNT: &str = "GetDBTableRowCount";
}

/// String manipulation driver commands
pub mod string {
    #![allow(missing_docs)]

    pub const LENGTH: &str = "Length";
    pub const COMPARE: &str = "Compare";
    pub const CONCATENATE: &str = "Concatenate";
    pub const TO_UPPER_CASE: &str = "ToUpperCase";
    pub const TO_LOWER_CASE: &str = "ToLowerCase";
    pub const LEFT_TRIM: &str = "LeftTrim";
    pub const RIGHT_TRIM: &str = "RightTrim";
    pub const TRIM: &str = "Trim";
    pub const LEFT: &str = "Left";
    pub const RIGHT: &str = "Right";
    pub const SUB_STRING: &str = "SubString";
    pub const INDEX: &str = "Index";
    pub const REPLACE: &str = "Replace";
    pub const GET_FIELD: &str = "GetField";
    pub const GET_FIELD_COUNT: &str = "GetFieldCount";
    pub const GET_SYSTEM_ENVIRON: &str = "GetSystemEnviron";
    pub const GET_SYSTEM_USER: &str = "GetSystemUser";
}

/// Flow control driver commands
pub mod flow {
    #![allow(missing_docs)]

    pub const ON_EQUAL_GOTO_BLOCK_ID: &str = "OnEqualGotoBlockID";
    pub const ON_NOT_EQUAL_GOTO_BLOCK_ID: &str = "OnNotEqualGotoBlockID";
    pub const ON_GREATER_THAN_GOTO_BLOCK_ID: &str = "OnGreaterThanGotoBlockID";
    pub const ON_LESS_THAN_GOTO_BLOCK_ID: &str = "OnLessThanGotoBlockID";
    pub const ON_CONTAINS_GOTO_BLOCK_ID: &str = "OnContainsGotoBlockID";
    pub const ON_FILE_EXIST_GOTO_BLOCK_ID: &str = "OnFileExistGotoBlockID";
    pub const ON_FILE_NOT_EXIST_GOTO_BLOCK_ID: &str = "OnFileNotExistGotoBlockID";
    pub const GOTO_BLOCK_ID: &str = "GotoBlockID";
    pub const EXIT_TABLE: &str = "ExitTable";
}

/// Timer driver commands
pub mod timer {
    #![allow(missing_docs)]

    pub const START_TIMER: &str = "StartTimer";
    pub const STOP_TIMER: &str = "StopTimer";
    pub const RESET_TIMER: &str = "ResetTimer";
    pub const VERIFY_TIMER: &str = "VerifyTimer";
    pub const STORE_TIMER_INFO: &str = "StoreTimerInfo";

    /// Variable suffix holding the start timestamp
    pub const START_TIME_SUFFIX: &str = ".startTime";
    /// Variable suffix holding the stop timestamp
    pub const END_TIME_SUFFIX: &str = ".endTime";
    /// Variable suffix holding elapsed milliseconds
    pub const ELAPSED_SUFFIX: &str = ".elapsed";
}

/// Engine (GUI introspection) commands
pub mod engine {
    #![allow(missing_docs)]

    pub const ENABLE_DOMAINS: &str = "enableDomains";
    pub const GET_DOMAIN_NAME: &str = "getDomainName";
    pub const GET_CAPTION: &str = "getCaption";
    pub const GET_CHILD_COUNT: &str = "getChildCount";
    pub const GET_CHILDREN: &str = "getChildren";
    pub const GET_CLASS_NAME: &str = "getClassName";
    pub const GET_CLASS_INDEX: &str = "getClassIndex";
    pub const GET_ID: &str = "getID";
    pub const GET_LEVEL: &str = "getLevel";
    pub const GET_MATCHING_CHILD_OBJECTS: &str = "getMatchingChildObjects";
    pub const GET_MATCHING_PARENT_OBJECT: &str = "getMatchingParentObject";
    pub const GET_MATCHING_PATH_OBJECT: &str = "getMatchingPathObject";
    pub const GET_NAME: &str = "getName";
    pub const GET_ACCESSIBLE_NAME: &str = "getAccessibleName";
    pub const GET_NON_ACCESSIBLE_NAME: &str = "getNonAccessibleName";
    pub const GET_PROPERTY: &str = "getProperty";
    pub const GET_PROPERTY_NAMES: &str = "getPropertyNames";
    pub const GET_STRING_DATA: &str = "getStringData";
    pub const GET_SUPER_CLASS_NAMES: &str = "getSuperClassNames";
    pub const GET_TEXT: &str = "getText";
    pub const GET_TOP_LEVEL_COUNT: &str = "getTopLevelCount";
    pub const GET_TOP_LEVEL_WINDOWS: &str = "getTopLevelWindows";
    pub const IS_MATCHING_PATH: &str = "isMatchingPath";
    pub const IS_SHOWING: &str = "isShowing";
    pub const IS_VALID: &str = "isValid";
    pub const SET_ACTIVE_WINDOW: &str = "setActiveWindow";
    pub const IS_TOP_LEVEL_POPUP_CONTAINER: &str = "isTopLevelPopupContainer";
    pub const GET_OBJECT_RECOGNITION_AT_SCREEN_COORDS: &str = "getObjectRecognitionAtScreenCoords";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_predicates() {
        for rt in ["C", "c", "CW", "cf", " C "] {
            assert!(is_driver_command_record(rt), "{rt}");
        }
        for rt in ["T", "tw", "TF"] {
            assert!(is_test_step_record(rt), "{rt}");
            assert!(!is_driver_command_record(rt), "{rt}");
        }
        assert!(is_engine_command_record("e"));
        assert!(!is_engine_command_record("EX"));
        assert!(is_block_id_record("b"));
        assert!(!is_driver_command_record(""));
    }
}
