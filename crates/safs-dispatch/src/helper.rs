//! Record exchange with the variable store
//!
//! [`RecordHelper`] is the shared context threaded through every processor:
//! the record itself plus the variable store the transport uses to hand
//! records in and read results back.

use crate::error::VariableError;
use crate::variables::{MemoryVariables, VariableStore};
use safs_record::{StatusCode, TestRecord};
use std::fmt;
use std::sync::Arc;

/// Default variable prefix for hook record exchange
pub const DEFAULT_INSTANCE_NAME: &str = "SAFS/Hook/";

/// Variable suffixes used for record exchange
pub mod vars {
    #![allow(missing_docs)]

    pub const INPUT_RECORD: &str = "inputrecord";
    pub const STATUS_CODE: &str = "statuscode";
    pub const STATUS_INFO: &str = "statusinfo";
    pub const FILENAME: &str = "filename";
    pub const LINE_NUMBER: &str = "linenumber";
    pub const SEPARATOR: &str = "separator";
    pub const FAC: &str = "fac";
    pub const TEST_LEVEL: &str = "testlevel";
    pub const APP_MAP_NAME: &str = "appmapname";
    pub const PROJECT_DIRECTORY: &str = "safsprojectdirectory";
    pub const TEST_DIRECTORY: &str = "safstestdirectory";
    pub const BENCH_DIRECTORY: &str = "safsbenchdirectory";
}

/// A record plus the collaborators needed to exchange it
pub struct RecordHelper {
    /// The record being processed
    pub record: TestRecord,
    variables: Arc<dyn VariableStore>,
    instance_name: String,
    comp_instance_path: Option<String>,
}

impl RecordHelper {
    /// Wrap a record with a variable store
    #[must_use]
    pub fn new(record: TestRecord, variables: Arc<dyn VariableStore>) -> Self {
        Self {
            record,
            variables,
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            comp_instance_path: None,
        }
    }

    /// Empty record backed by an in-memory store
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(TestRecord::new(), Arc::new(MemoryVariables::new()))
    }

    /// With variable prefix
    #[inline]
    #[must_use]
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    /// With engine package prefix for component function lookup
    #[inline]
    #[must_use]
    pub fn with_comp_instance_path(mut self, path: impl Into<String>) -> Self {
        self.comp_instance_path = Some(path.into());
        self
    }

    /// Variable store
    #[inline]
    #[must_use]
    pub fn variables(&self) -> &dyn VariableStore {
        self.variables.as_ref()
    }

    /// Shared handle to the variable store
    #[inline]
    #[must_use]
    pub fn variables_handle(&self) -> Arc<dyn VariableStore> {
        Arc::clone(&self.variables)
    }

    /// Variable prefix
    #[inline]
    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Engine package prefix, if the engine provides one
    #[inline]
    #[must_use]
    pub fn comp_instance_path(&self) -> Option<&str> {
        self.comp_instance_path.as_deref()
    }

    fn var(&self, suffix: &str) -> Result<Option<String>, VariableError> {
        self.variables.get(&format!("{}{suffix}", self.instance_name))
    }

    /// Fill the record from `<instance>inputrecord`, `<instance>separator`, ...
    ///
    /// Non-numeric line numbers and status codes read as 0.
    ///
    /// # Errors
    /// Variable store failures.
    pub fn populate_from_variables(&mut self) -> Result<(), VariableError> {
        let input = self.var(vars::INPUT_RECORD)?;
        let separator = self.var(vars::SEPARATOR)?;
        let line = self.var(vars::LINE_NUMBER)?;
        let status = self.var(vars::STATUS_CODE)?;
        let filename = self.var(vars::FILENAME)?;
        let test_level = self.var(vars::TEST_LEVEL)?;
        let app_map_name = self.var(vars::APP_MAP_NAME)?;
        let fac = self.var(vars::FAC)?;
        let status_info = self.var(vars::STATUS_INFO)?;

        let record = &mut self.record;
        record.reinit();
        if let Some(input) = input {
            record.set_input_record(input);
        }
        if let Some(separator) = separator {
            record.set_separator(separator);
        }
        record.line_number = line.and_then(|n| n.trim().parse().ok()).unwrap_or(0);
        let code = status.and_then(|code| code.trim().parse::<i32>().ok()).unwrap_or(0);
        record.status_code = StatusCode::from_code(code).unwrap_or_else(|| {
            tracing::debug!("undefined status code {code} read as GENERAL_SCRIPT_FAILURE");
            StatusCode::GeneralScriptFailure
        });
        record.filename = filename;
        record.test_level = test_level;
        record.app_map_name = app_map_name;
        record.fac = fac;
        record.status_info = status_info;
        Ok(())
    }

    /// Write `<instance>statuscode` and `<instance>statusinfo`
    ///
    /// Unset status info is written as an empty string.
    ///
    /// # Errors
    /// Variable store failures.
    pub fn send_back_response(&self) -> Result<(), VariableError> {
        let prefix = &self.instance_name;
        self.variables.set(
            &format!("{prefix}{}", vars::STATUS_CODE),
            &self.record.status_code.code().to_string(),
        )?;
        self.variables.set(
            &format!("{prefix}{}", vars::STATUS_INFO),
            self.record.status_info.as_deref().unwrap_or(""),
        )
    }
}

impl fmt::Debug for RecordHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHelper")
            .field("record", &self.record)
            .field("instance_name", &self.instance_name)
            .field("comp_instance_path", &self.comp_instance_path)
            .finish_non_exhaustive()
    }
}
