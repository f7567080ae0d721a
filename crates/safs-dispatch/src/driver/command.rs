//! Command tables shared by the driver command families
//!
//! Each family is a [`CommandFamily`]: a static table of command names and
//! handler functions plus whatever state the family keeps between records.
//! Handlers report through [`CommandContext`] and return a [`CommandError`]
//! for anything that should fail the record; the family converts it into a
//! status code and log message at the processor boundary.

use crate::config::BreakpointFamily;
use crate::error::CommandError;
use crate::helper::{vars, RecordHelper};
use crate::log::MessageKind;
use crate::processor::{Processor, ProcessorBase, ProcessorServices};
use safs_record::{keywords, StatusCode};
use std::fmt;
use std::path::{Path, PathBuf};

/// Handler for one driver command
pub type CommandHandler<S> = fn(&mut S, &mut CommandContext<'_>) -> Result<(), CommandError>;

/// Table of command names and handlers, matched case-insensitively
pub type CommandTable<S> = &'static [(&'static str, CommandHandler<S>)];

/// Find the handler registered for `command`
#[must_use]
pub fn find_command<S>(table: CommandTable<S>, command: &str) -> Option<CommandHandler<S>> {
    let command = command.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(command))
        .map(|(_, handler)| *handler)
}

/// Everything a command handler may touch while running one record
pub struct CommandContext<'a> {
    /// Record being processed
    pub rec: &'a mut RecordHelper,
    base: &'a ProcessorBase,
    command: String,
    params: Vec<String>,
}

impl<'a> CommandContext<'a> {
    /// Context for `command` with the parameters held by `base`
    pub fn new(rec: &'a mut RecordHelper, base: &'a ProcessorBase, command: String) -> Self {
        let params = base.params().to_vec();
        Self {
            rec,
            base,
            command,
            params,
        }
    }

    /// Command being run
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// All parameters
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Owning processor state
    #[must_use]
    pub fn base(&self) -> &ProcessorBase {
        self.base
    }

    /// Parameter `index`, if supplied
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Fail unless at least `min` parameters are present
    ///
    /// # Errors
    /// [`CommandError::ParameterCount`].
    pub fn require(&self, min: usize) -> Result<(), CommandError> {
        if self.params.len() < min {
            return Err(CommandError::ParameterCount {
                expected: min,
                actual: self.params.len(),
            });
        }
        Ok(())
    }

    /// Parameter `index`, failing with a count error when absent
    ///
    /// # Errors
    /// [`CommandError::ParameterCount`].
    pub fn arg(&self, index: usize) -> Result<&str, CommandError> {
        self.param(index).ok_or(CommandError::ParameterCount {
            expected: index + 1,
            actual: self.params.len(),
        })
    }

    /// Parameter `index` parsed as an integer
    ///
    /// # Errors
    /// Missing parameter, or [`CommandError::ParameterValue`] naming `name`.
    pub fn int_arg(&self, index: usize, name: &str) -> Result<i64, CommandError> {
        let value = self.arg(index)?;
        value
            .trim()
            .parse()
            .map_err(|_| CommandError::ParameterValue(format!("{name}={value}")))
    }

    /// Variable name held in parameter `index`, without a leading `^`
    ///
    /// # Errors
    /// Missing parameter, or an empty name.
    pub fn var_name(&self, index: usize) -> Result<String, CommandError> {
        let raw = self.arg(index)?;
        let name = raw.strip_prefix('^').unwrap_or(raw).trim();
        if name.is_empty() {
            return Err(CommandError::ParameterValue(format!("variable name '{raw}'")));
        }
        Ok(name.to_string())
    }

    /// Read a variable
    ///
    /// # Errors
    /// Variable store failures.
    pub fn get_var(&self, name: &str) -> Result<Option<String>, CommandError> {
        Ok(self.rec.variables().get(name)?)
    }

    /// Write a variable
    ///
    /// # Errors
    /// Variable store failures.
    pub fn set_var(&self, name: &str, value: &str) -> Result<(), CommandError> {
        tracing::debug!("{}: {name} = {value}", self.command);
        Ok(self.rec.variables().set(name, value)?)
    }

    /// Hook-level variable such as `<instance>safsprojectdirectory`
    ///
    /// # Errors
    /// Variable store failures.
    pub fn instance_var(&self, suffix: &str) -> Result<Option<String>, CommandError> {
        self.get_var(&format!("{}{suffix}", self.rec.instance_name()))
    }

    /// Write a hook-level variable
    ///
    /// # Errors
    /// Variable store failures.
    pub fn set_instance_var(&self, suffix: &str, value: &str) -> Result<(), CommandError> {
        self.set_var(&format!("{}{suffix}", self.rec.instance_name()), value)
    }

    /// Resolve a relative path against the project directory, when one is set
    ///
    /// # Errors
    /// Empty path, or variable store failures.
    pub fn resolve_path(&self, raw: &str) -> Result<PathBuf, CommandError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CommandError::ParameterValue("empty file name".into()));
        }
        let path = Path::new(trimmed);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        match self.instance_var(vars::PROJECT_DIRECTORY)? {
            Some(dir) if !dir.trim().is_empty() => Ok(Path::new(dir.trim()).join(path)),
            _ => Ok(path.to_path_buf()),
        }
    }

    /// Switch to another command of the same family with new parameters
    pub fn redirect(&mut self, command: &str, params: Vec<String>) {
        self.command = command.to_string();
        self.rec.record.command = Some(command.to_string());
        self.params = params;
    }

    /// `OK` with a PASSED message
    pub fn generic_success(&mut self, comment: &str) {
        self.rec.record.status_code = StatusCode::OK;
        let message = if comment.is_empty() {
            format!("{} successful.", self.command)
        } else {
            format!("{} successful. {comment}", self.command)
        };
        self.base.log_message(self.rec, &message, MessageKind::Passed);
    }

    /// `SCRIPT_WARNING` with a WARNING message
    pub fn action_warning(&mut self, warning: &str) {
        self.rec.record.status_code = StatusCode::ScriptWarning;
        let record = &self.rec.record;
        let detail = format!(
            "{} warning in table {} at line {}",
            self.command,
            record.filename.as_deref().unwrap_or(""),
            record.line_number
        );
        self.base.log().log_detail(
            record.fac.as_deref(),
            &format!("{} was not successful. {warning}", self.command),
            &detail,
            MessageKind::Warning,
        );
    }

    /// `GENERAL_SCRIPT_FAILURE` for too few parameters
    pub fn parameter_count_failure(&mut self, detail: &str) {
        self.input_record_failure(&format!("Insufficient Parameters. {detail}"));
    }

    /// `GENERAL_SCRIPT_FAILURE` for an unusable parameter value
    pub fn parameter_value_failure(&mut self, name: &str) {
        self.input_record_failure(&format!("Invalid parameter value for {name}."));
    }

    /// `GENERAL_SCRIPT_FAILURE` for a file that could not be used
    pub fn file_error_failure(&mut self, path: &str, detail: &str) {
        self.action_failure(&format!("Error opening or using {path}: {detail}"));
    }

    /// `GENERAL_SCRIPT_FAILURE` with "Unable to perform" wording
    pub fn action_failure(&mut self, error: &str) {
        self.rec.record.status_code = StatusCode::GeneralScriptFailure;
        let message = format!("Unable to perform '{}'.  {error}", self.command);
        let record = &self.rec.record;
        let detail = format!(
            "Error at line {} in file {} : {error}",
            record.line_number,
            record.filename.as_deref().unwrap_or("")
        );
        self.base
            .log()
            .log_detail(record.fac.as_deref(), &message, &detail, MessageKind::Failed);
    }

    fn input_record_failure(&mut self, error: &str) {
        self.rec.record.status_code = StatusCode::GeneralScriptFailure;
        let message = format!("{}: {error}", self.command);
        self.base
            .standard_failure_message(self.rec, &message, self.rec.record.input_record().unwrap_or(""));
    }

    /// Convert a handler error into status and log output
    pub fn fail(&mut self, err: CommandError) {
        tracing::debug!("{} failed: {err}", self.command);
        match err {
            CommandError::ParameterCount { expected, actual } => self.parameter_count_failure(
                &format!("expected at least {expected} parameters, got {actual}"),
            ),
            CommandError::ParameterValue(name) => self.parameter_value_failure(&name),
            CommandError::File { path, source } => self.file_error_failure(&path, &source.to_string()),
            other => self.action_failure(&other.to_string()),
        }
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("command", &self.command)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A driver command vocabulary backed by a command table
pub struct CommandFamily<S: 'static> {
    name: &'static str,
    base: ProcessorBase,
    state: S,
    commands: CommandTable<S>,
}

impl<S: Send + 'static> CommandFamily<S> {
    /// Create a family named `name` over `commands`
    #[must_use]
    pub fn new(name: &'static str, services: ProcessorServices, state: S, commands: CommandTable<S>) -> Self {
        Self {
            name,
            base: ProcessorBase::new(services).with_family(BreakpointFamily::Driver),
            state,
            commands,
        }
    }

    /// Family state
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Family state, mutably
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Whether `command` belongs to this family
    #[must_use]
    pub fn handles(&self, command: &str) -> bool {
        find_command(self.commands, command).is_some()
    }

    /// Command names in table order
    pub fn command_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|(name, _)| *name)
    }
}

impl<S: Send + 'static> Processor for CommandFamily<S> {
    fn name(&self) -> &str {
        self.name
    }

    fn is_supported_record_type(&self, record_type: &str) -> bool {
        keywords::is_driver_command_record(record_type)
    }

    fn process(&mut self, rec: &mut RecordHelper) {
        let command = rec.record.command.clone().unwrap_or_default();
        let Some(handler) = find_command(self.commands, &command) else {
            self.base.set_record_processed(false);
            return;
        };
        self.base.set_record_processed(true);
        tracing::debug!("{} handling {command}", self.name);

        let mut ctx = CommandContext::new(rec, &self.base, command);
        if let Err(err) = handler(&mut self.state, &mut ctx) {
            ctx.fail(err);
        }
    }

    fn base(&self) -> &ProcessorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessorBase {
        &mut self.base
    }
}

impl<S: fmt::Debug + 'static> fmt::Debug for CommandFamily<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFamily")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safs_record::TestRecord;

    fn echo(_: &mut u32, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let value = ctx.arg(0)?.to_string();
        let name = ctx.var_name(1)?;
        ctx.set_var(&name, &value)?;
        ctx.generic_success("");
        Ok(())
    }

    fn count(calls: &mut u32, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        *calls += 1;
        ctx.generic_success("");
        Ok(())
    }

    static TABLE: CommandTable<u32> = &[("Echo", echo), ("Count", count)];

    fn run(family: &mut CommandFamily<u32>, line: &str) -> RecordHelper {
        let mut rec = RecordHelper::in_memory();
        rec.record = TestRecord::from_line(line, ",");
        let params: Vec<String> = (2..rec.record.token_count().unwrap())
            .map(|i| rec.record.trimmed_unquoted_token(i).unwrap().to_string())
            .collect();
        rec.record.command = Some(rec.record.trimmed_unquoted_token(1).unwrap().to_string());
        family.set_params(params);
        family.process(&mut rec);
        rec
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(find_command(TABLE, "echo").is_some());
        assert!(find_command(TABLE, " COUNT ").is_some());
        assert!(find_command(TABLE, "Missing").is_none());
    }

    #[test]
    fn test_unknown_command_is_not_processed() {
        let mut family = CommandFamily::new("test", ProcessorServices::new(), 0, TABLE);
        let rec = run(&mut family, "C,Missing");
        assert!(!family.is_record_processed());
        assert_eq!(rec.record.status_code, StatusCode::ScriptNotExecuted);
    }

    #[test]
    fn test_handler_state_and_variables() {
        let mut family = CommandFamily::new("test", ProcessorServices::new(), 0, TABLE);
        run(&mut family, "C,Count");
        run(&mut family, "C,count");
        assert_eq!(*family.state(), 2);

        let rec = run(&mut family, "C,Echo,hello,^out");
        assert!(family.is_record_processed());
        assert_eq!(rec.record.status_code, StatusCode::OK);
        assert_eq!(rec.variables().get("out").unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_errors_become_failures() {
        let mut family = CommandFamily::new("test", ProcessorServices::new(), 0, TABLE);
        let rec = run(&mut family, "C,Echo,hello");
        assert!(family.is_record_processed());
        assert_eq!(rec.record.status_code, StatusCode::GeneralScriptFailure);

        let rec = run(&mut family, "C,Echo,hello,^");
        assert_eq!(rec.record.status_code, StatusCode::GeneralScriptFailure);
    }
}
