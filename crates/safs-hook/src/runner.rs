//! Table runner
//!
//! Feeds a test table through a [`ProcessRequest`] one line at a time. Each
//! line is exchanged through the hook variables the way a remote driver
//! would: the request fields are written to `<instance>inputrecord`,
//! `<instance>separator` and friends, the record is populated from them, and
//! the result is sent back as `<instance>statuscode`/`<instance>statusinfo`.
//!
//! Blank lines and lines starting with `;` are skipped. `B` records are
//! block labels and are never dispatched. A `SHUTDOWN_HOOK` line ends the
//! run.

use crate::config::HookConfig;
use crate::error::{HookError, HookResult};
use safs_dispatch::{
    vars, InitializationError, LogSink, MemoryVariables, ProcessRequest, ProcessorServices,
    ProcessorSettings, ProcessorSlots, RecordHelper, TracingLog, VariableStore,
};
use safs_record::{keywords, RecordOutcome, StatusCode, TestRecord, SHUTDOWN_HOOK};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Why a table run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Ran past the last line
    EndOfTable,
    /// A record returned `EXIT_TABLE_COMMAND`
    ExitTable,
    /// A `SHUTDOWN_HOOK` line was read
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EndOfTable => "end of table",
            Self::ExitTable => "exit table",
            Self::Shutdown => "shutdown",
        })
    }
}

/// Outcomes of one table run, in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    /// Table name
    pub table: String,
    /// One entry per executed record
    pub outcomes: Vec<RecordOutcome>,
    /// Why the run ended
    pub stop: StopReason,
}

impl TableReport {
    /// Number of records that ended with `status`
    #[must_use]
    pub fn count(&self, status: StatusCode) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status_code == status.code())
            .count()
    }

    /// Number of records whose status reports a failure
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| StatusCode::from_code(outcome.status_code).is_some_and(StatusCode::is_failure))
            .count()
    }

    /// No failures and nothing left unexecuted
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures() == 0 && self.count(StatusCode::ScriptNotExecuted) == 0
    }
}

impl fmt::Display for TableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            write!(
                f,
                "{:>5}  {:<24} {}",
                outcome.line_number,
                outcome.status_name,
                outcome.input_record.trim()
            )?;
            if !outcome.status_info.is_empty() {
                write!(f, "  => {}", outcome.status_info)?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "{}: {} records, {} failed, {} warnings, {} not executed ({})",
            self.table,
            self.outcomes.len(),
            self.failures(),
            self.count(StatusCode::ScriptWarning),
            self.count(StatusCode::ScriptNotExecuted),
            self.stop
        )
    }
}

/// Runs test tables through one long-lived dispatcher
pub struct TableRunner {
    config: HookConfig,
    request: ProcessRequest,
    variables: Arc<MemoryVariables>,
}

impl TableRunner {
    /// Runner with the standard processors logging through `tracing`
    #[must_use]
    pub fn new(config: HookConfig) -> Self {
        Self::with_log(config, Arc::new(TracingLog))
    }

    /// Runner with the standard processors and a custom test log
    #[must_use]
    pub fn with_log(config: HookConfig, log: Arc<dyn LogSink>) -> Self {
        let services = Self::services(&config);
        Self::build(config, |rec| ProcessRequest::new(rec, log, &services))
    }

    /// Runner with explicit processor slots
    #[must_use]
    pub fn with_slots(config: HookConfig, log: Arc<dyn LogSink>, slots: ProcessorSlots) -> Self {
        Self::build(config, |rec| ProcessRequest::with_processors(rec, log, slots))
    }

    fn services(config: &HookConfig) -> ProcessorServices {
        let settings = ProcessorSettings::from_config(&config.processor);
        ProcessorServices::new().with_settings(Arc::new(settings))
    }

    fn build(config: HookConfig, request: impl FnOnce(RecordHelper) -> ProcessRequest) -> Self {
        let variables = Arc::new(MemoryVariables::new());
        let rec = RecordHelper::new(TestRecord::new(), variables.clone())
            .with_instance_name(config.instance_name.clone());
        Self {
            request: request(rec),
            config,
            variables,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// Variable store shared by every record of every run
    #[must_use]
    pub fn variables(&self) -> &Arc<MemoryVariables> {
        &self.variables
    }

    /// Dispatcher, for attaching extra processors
    pub fn request_mut(&mut self) -> &mut ProcessRequest {
        &mut self.request
    }

    /// Run the table stored at `path`
    ///
    /// # Errors
    /// See [`TableRunner::run_table`]; also [`HookError::Io`] when the file
    /// cannot be read.
    pub fn run_file(&mut self, path: &Path) -> HookResult<TableReport> {
        let text = fs::read_to_string(path).map_err(|source| HookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.run_table(&name, &text)
    }

    /// Run the lines of `text` as the table `name`
    ///
    /// # Errors
    /// Dispatcher setup defects, variable store failures, a branch to an
    /// undefined block, or more than `max_steps` executed records.
    pub fn run_table(&mut self, name: &str, text: &str) -> HookResult<TableReport> {
        self.apply_project_directory()?;
        let lines: Vec<&str> = text.lines().collect();
        let blocks = self.block_index(&lines);
        tracing::info!("running table {name}: {} lines, {} blocks", lines.len(), blocks.len());

        let mut outcomes = Vec::new();
        let mut next = 0;
        let stop = loop {
            let Some(&line) = lines.get(next) else {
                break StopReason::EndOfTable;
            };
            let line_number = next as u64 + 1;
            next += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }
            if trimmed == SHUTDOWN_HOOK {
                break StopReason::Shutdown;
            }
            if self.block_label(line).is_some() {
                continue;
            }
            if outcomes.len() >= self.config.max_steps {
                return Err(HookError::StepLimit(self.config.max_steps));
            }

            let outcome = self.execute(name, line_number, line)?;
            let status = StatusCode::from_code(outcome.status_code);
            let target = outcome.status_info.trim().to_string();
            outcomes.push(outcome);

            match status {
                Some(StatusCode::ExitTableCommand) => break StopReason::ExitTable,
                Some(StatusCode::BranchToBlockId) => {
                    let Some(&index) = blocks.get(&target.to_uppercase()) else {
                        return Err(HookError::BlockNotFound {
                            block: target,
                            line: line_number,
                        });
                    };
                    tracing::debug!("branching to block {target} at line {}", index + 1);
                    next = index + 1;
                }
                _ => {}
            }
        };

        tracing::info!("table {name} finished after {} records ({stop})", outcomes.len());
        Ok(TableReport {
            table: name.to_string(),
            outcomes,
            stop,
        })
    }

    fn apply_project_directory(&self) -> HookResult<()> {
        if let Some(dir) = &self.config.project_directory {
            self.set_hook_var(vars::PROJECT_DIRECTORY, dir)?;
        }
        Ok(())
    }

    /// Block name when `line` is a `B` record
    fn block_label(&self, line: &str) -> Option<String> {
        let record = TestRecord::from_line(line, self.config.separator.as_str());
        let record_type = record.trimmed_unquoted_token(0).ok()?;
        if !keywords::is_block_id_record(&record_type.to_uppercase()) {
            return None;
        }
        record
            .trimmed_unquoted_token(1)
            .ok()
            .map(str::to_uppercase)
            .filter(|name| !name.is_empty())
    }

    /// Upper-cased block name to line index; the first definition wins
    fn block_index(&self, lines: &[&str]) -> HashMap<String, usize> {
        let mut blocks = HashMap::new();
        for (index, line) in lines.iter().enumerate() {
            if let Some(name) = self.block_label(line) {
                blocks.entry(name).or_insert(index);
            }
        }
        blocks
    }

    fn set_hook_var(&self, suffix: &str, value: &str) -> HookResult<()> {
        let name = format!("{}{suffix}", self.config.instance_name);
        self.variables.set(&name, value)?;
        Ok(())
    }

    /// Exchange one record through the hook variables and dispatch it
    fn execute(&mut self, table: &str, line_number: u64, line: &str) -> HookResult<RecordOutcome> {
        self.set_hook_var(vars::INPUT_RECORD, line)?;
        self.set_hook_var(vars::SEPARATOR, &self.config.separator)?;
        self.set_hook_var(vars::FILENAME, table)?;
        self.set_hook_var(vars::LINE_NUMBER, &line_number.to_string())?;
        self.set_hook_var(vars::STATUS_CODE, &StatusCode::ScriptNotExecuted.code().to_string())?;
        self.set_hook_var(vars::STATUS_INFO, "")?;

        self.request
            .record_mut()
            .ok_or(InitializationError::MissingRecord)?
            .populate_from_variables()?;
        self.request.do_request()?;

        let rec = self.request.record().ok_or(InitializationError::MissingRecord)?;
        rec.send_back_response()?;
        tracing::debug!(
            "line {line_number}: {} {}",
            rec.record.status_code,
            rec.record.status_info.as_deref().unwrap_or("")
        );
        Ok(rec.record.outcome())
    }
}

impl fmt::Debug for TableRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRunner")
            .field("config", &self.config)
            .field("request", &self.request)
            .field("variables", &self.variables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(table: &str) -> (TableReport, TableRunner) {
        let mut runner = TableRunner::new(HookConfig::new());
        let report = runner.run_table("unit.sdd", table).unwrap();
        (report, runner)
    }

    #[test]
    fn test_comments_blanks_and_labels_are_not_executed() {
        let (report, _) = run("; setup\n\nB, Start\nC, SetVariableValueEx, a, 1\n");
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].line_number, 4);
        assert_eq!(report.stop, StopReason::EndOfTable);
        assert!(report.is_success());
    }

    #[test]
    fn test_result_is_sent_back_through_hook_variables() {
        let (report, runner) = run("C, ToLowerCase, ABC, lower\n");
        assert_eq!(report.outcomes[0].status_code, StatusCode::OK.code());
        let vars = runner.variables();
        assert_eq!(vars.get("lower").unwrap().as_deref(), Some("abc"));
        assert_eq!(vars.get("SAFS/Hook/statuscode").unwrap().as_deref(), Some("-1"));
        assert_eq!(vars.get("SAFS/Hook/filename").unwrap().as_deref(), Some("unit.sdd"));
        assert_eq!(vars.get("SAFS/Hook/linenumber").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_shutdown_line_stops_the_run() {
        let (report, _) = run("C, SetVariableValueEx, a, 1\nSHUTDOWN_HOOK\nC, SetVariableValueEx, b, 2\n");
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.stop, StopReason::Shutdown);
    }

    #[test]
    fn test_report_text_summary() {
        let (report, _) = run("C, SetVariableValueEx, a, 1\nQ, nothing\n");
        let text = report.to_string();
        assert!(text.contains("SCRIPT_NOT_EXECUTED"));
        assert!(text.ends_with("unit.sdd: 2 records, 0 failed, 0 warnings, 1 not executed (end of table)"));
        assert!(!report.is_success());
    }
}
