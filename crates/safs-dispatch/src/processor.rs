//! Processor contract
//!
//! A [`Processor`] claims records of some record types and acts on them
//! through the shared [`RecordHelper`]. Success is reported twice: through the
//! record's status code, which must leave the `SCRIPT_NOT_EXECUTED` sentinel,
//! and through the processor's own "record processed" flag, which chained and
//! nested processors use to say "right record type, unknown command".
//!
//! [`ProcessorBase`] carries the state every processor shares: log, params,
//! the processed flag, breakpoint switches, an optional chained processor and
//! a cache of processors resolved by name from the [`PluginRegistry`].

use crate::config::{BreakpointFamily, BreakpointHandler, LogBreakpoint, ProcessorSettings};
use crate::error::{ProcessError, VariableError};
use crate::helper::RecordHelper;
use crate::log::{LogSink, MessageKind, TracingLog};
use crate::plugin::{is_qualified_name, PluginRegistry};
use indexmap::IndexSet;
use safs_record::keywords::CUSTOM_STATUS_CODE_VARIABLE;
use safs_record::StatusCode;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A record processor
pub trait Processor: Send {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Whether records of `record_type` may be handed to [`Processor::process`]
    ///
    /// Must be free of side effects; record types compare case-insensitively.
    fn is_supported_record_type(&self, record_type: &str) -> bool;

    /// Act on the record held by `rec`
    fn process(&mut self, rec: &mut RecordHelper);

    /// Shared processor state
    fn base(&self) -> &ProcessorBase;

    /// Shared processor state, mutably
    fn base_mut(&mut self) -> &mut ProcessorBase;

    /// Whether the last [`Processor::process`] call recognized the record
    fn is_record_processed(&self) -> bool {
        self.base().is_record_processed()
    }

    /// Set the processed flag
    fn set_record_processed(&mut self, processed: bool) {
        self.base_mut().set_record_processed(processed);
    }

    /// Whether a log collaborator is attached
    fn has_log(&self) -> bool {
        self.base().has_log()
    }

    /// Attach a log collaborator
    fn set_log(&mut self, log: Arc<dyn LogSink>) {
        self.base_mut().set_log(log);
    }

    /// Replace the parameters interpreted by an outer processor
    fn set_params(&mut self, params: Vec<String>) {
        self.base_mut().set_params(params);
    }
}

/// Collaborators shared by all processors of one dispatcher
#[derive(Clone)]
pub struct ProcessorServices {
    /// Convention-named processor factories
    pub registry: Arc<PluginRegistry>,
    /// Runtime settings and breakpoint switches
    pub settings: Arc<ProcessorSettings>,
    /// Action run when a breakpoint fires
    pub breakpoint_handler: Arc<dyn BreakpointHandler>,
}

impl ProcessorServices {
    /// Create services with an empty registry and default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With plugin registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// With shared settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: Arc<ProcessorSettings>) -> Self {
        self.settings = settings;
        self
    }

    /// With breakpoint action
    #[inline]
    #[must_use]
    pub fn with_breakpoint_handler(mut self, handler: Arc<dyn BreakpointHandler>) -> Self {
        self.breakpoint_handler = handler;
        self
    }
}

impl Default for ProcessorServices {
    fn default() -> Self {
        Self {
            registry: Arc::new(PluginRegistry::new()),
            settings: ProcessorSettings::shared(),
            breakpoint_handler: Arc::new(LogBreakpoint),
        }
    }
}

impl fmt::Debug for ProcessorServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorServices")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// State and behavior shared by every processor
pub struct ProcessorBase {
    log: Option<Arc<dyn LogSink>>,
    params: Vec<String>,
    record_processed: bool,
    my_breakpoints: bool,
    family: BreakpointFamily,
    chained: Option<Box<dyn Processor>>,
    proc_instance_path: Option<String>,
    custom_proc_instance_path: Option<String>,
    processor_map: HashMap<String, Box<dyn Processor>>,
    services: ProcessorServices,
}

impl ProcessorBase {
    /// Create base state using `services`
    #[must_use]
    pub fn new(services: ProcessorServices) -> Self {
        Self {
            log: None,
            params: Vec::new(),
            record_processed: false,
            my_breakpoints: false,
            family: BreakpointFamily::None,
            chained: None,
            proc_instance_path: None,
            custom_proc_instance_path: None,
            processor_map: HashMap::new(),
            services,
        }
    }

    /// With family breakpoint switch
    #[inline]
    #[must_use]
    pub fn with_family(mut self, family: BreakpointFamily) -> Self {
        self.family = family;
        self
    }

    /// With log collaborator
    #[inline]
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Shared collaborators
    #[inline]
    #[must_use]
    pub fn services(&self) -> &ProcessorServices {
        &self.services
    }

    /// Runtime settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ProcessorSettings {
        &self.services.settings
    }

    /// Plugin registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.services.registry
    }

    /// Whether the last run recognized the record
    #[inline]
    #[must_use]
    pub fn is_record_processed(&self) -> bool {
        self.record_processed
    }

    /// Set the processed flag
    #[inline]
    pub fn set_record_processed(&mut self, processed: bool) {
        self.record_processed = processed;
    }

    /// Whether a log collaborator is attached
    #[inline]
    #[must_use]
    pub fn has_log(&self) -> bool {
        self.log.is_some()
    }

    /// Attach a log collaborator; a chained processor without one gets it too
    pub fn set_log(&mut self, log: Arc<dyn LogSink>) {
        if let Some(chained) = self.chained.as_mut() {
            if !chained.has_log() {
                chained.set_log(Arc::clone(&log));
            }
        }
        self.log = Some(log);
    }

    /// Attached log, or a `tracing` fallback
    #[must_use]
    pub fn log(&self) -> &dyn LogSink {
        match &self.log {
            Some(log) => log.as_ref(),
            None => &TracingLog,
        }
    }

    /// Parameters of the current record
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Replace the parameters
    #[inline]
    pub fn set_params(&mut self, params: Vec<String>) {
        self.params = params;
    }

    /// Subclass processor path; falls back to the configured one
    #[must_use]
    pub fn proc_instance_path(&self) -> Option<&str> {
        self.proc_instance_path
            .as_deref()
            .or_else(|| self.settings().proc_instance_path())
    }

    /// Set subclass processor path
    pub fn set_proc_instance_path(&mut self, path: impl Into<String>) {
        self.proc_instance_path = Some(path.into());
    }

    /// Custom processor path; falls back to the configured one
    #[must_use]
    pub fn custom_proc_instance_path(&self) -> Option<&str> {
        self.custom_proc_instance_path
            .as_deref()
            .or_else(|| self.settings().custom_proc_instance_path())
    }

    /// Set custom processor path
    pub fn set_custom_proc_instance_path(&mut self, path: impl Into<String>) {
        self.custom_proc_instance_path = Some(path.into());
    }

    /// Whether a processor is registered under a well-formed `name`
    #[must_use]
    pub fn valid_processor_class_name(&self, name: &str) -> bool {
        self.registry().is_valid(name)
    }

    /// Subclass candidates: the instance path itself when it names a processor
    #[must_use]
    pub fn proc_class_names(&self) -> Vec<String> {
        self.proc_instance_path()
            .filter(|path| self.valid_processor_class_name(path))
            .map(str::to_string)
            .into_iter()
            .collect()
    }

    /// Custom candidates: the custom path itself when it names a processor
    #[must_use]
    pub fn custom_proc_class_names(&self) -> Vec<String> {
        self.custom_proc_instance_path()
            .filter(|path| self.valid_processor_class_name(path))
            .map(str::to_string)
            .into_iter()
            .collect()
    }

    /// Install a processor to try when this one does not recognize a record
    pub fn set_chained_processor(&mut self, mut processor: Box<dyn Processor>) {
        if let Some(log) = &self.log {
            if !processor.has_log() {
                processor.set_log(Arc::clone(log));
            }
        }
        self.chained = Some(processor);
    }

    /// Whether a chained processor is installed
    #[inline]
    #[must_use]
    pub fn has_chained_processor(&self) -> bool {
        self.chained.is_some()
    }

    /// Remove the chained processor
    pub fn take_chained_processor(&mut self) -> Option<Box<dyn Processor>> {
        self.chained.take()
    }

    /// Delegate to the chained processor, or mark the record not processed
    pub fn process_chained(&mut self, rec: &mut RecordHelper) {
        match self.chained.as_mut() {
            Some(chained) => {
                chained.set_params(self.params.clone());
                chained.process(rec);
                self.record_processed = chained.is_record_processed();
            }
            None => self.record_processed = false,
        }
    }

    /// Hand log and params to `processor`, run it, and report success
    ///
    /// Success requires the processed flag AND a status away from the
    /// sentinel, so a processor that forgets to clear its flag cannot claim a
    /// record it never touched.
    pub fn init_and_process(&self, processor: &mut dyn Processor, rec: &mut RecordHelper) -> bool {
        tracing::debug!("trying processor: {}", processor.name());
        processor.set_record_processed(true);
        if let Some(log) = &self.log {
            processor.set_log(Arc::clone(log));
        }
        processor.set_params(self.params.clone());
        processor.process(rec);
        processor.is_record_processed() && !rec.record.status_code.is_not_executed()
    }

    /// Resolve `name` (cached after first use) and run it
    pub fn instance_and_process(&mut self, name: &str, rec: &mut RecordHelper) -> bool {
        let mut processor = match self.processor_map.remove(name) {
            Some(processor) => processor,
            None => match self.services.registry.resolve(name) {
                Ok(Some(processor)) => processor,
                Ok(None) => {
                    tracing::info!("can't find processor: {name}");
                    return false;
                }
                Err(e) => {
                    tracing::info!("{e}");
                    return false;
                }
            },
        };
        let success = self.init_and_process(processor.as_mut(), rec);
        self.processor_map.insert(name.to_string(), processor);
        success
    }

    /// Try each distinct candidate name in order until one succeeds
    pub fn process_candidates<I>(&mut self, names: I, rec: &mut RecordHelper) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        let candidates: IndexSet<String> = names
            .into_iter()
            .filter(|name| is_qualified_name(name))
            .collect();
        candidates
            .iter()
            .any(|name| self.instance_and_process(name, rec))
    }

    /// Number of processors cached by name
    #[inline]
    #[must_use]
    pub fn cached_processor_count(&self) -> usize {
        self.processor_map.len()
    }

    /// Per-instance breakpoint switch
    #[inline]
    pub fn set_my_breakpoints(&mut self, on: bool) {
        self.my_breakpoints = on;
    }

    /// Global OR family OR instance breakpoint switch
    #[must_use]
    pub fn check_breakpoints(&self) -> bool {
        let settings = self.settings();
        settings.breakpoints() || settings.family_breakpoints(self.family) || self.my_breakpoints
    }

    /// Run the breakpoint action for the current record
    pub fn activate_breakpoint(&self, rec: &RecordHelper) {
        let record = &rec.record;
        let message = format!(
            "{} line {}: {}",
            record.filename.as_deref().unwrap_or(""),
            record.line_number,
            record.input_record().unwrap_or("")
        );
        self.services
            .breakpoint_handler
            .activate(&message, Some(self.log()));
    }

    /// Log a message against the record's facility
    pub fn log_message(&self, rec: &RecordHelper, message: &str, kind: MessageKind) {
        self.log().log_message(rec.record.fac.as_deref(), message, kind);
    }

    /// Log a failure naming the table and line of the current record
    pub fn standard_failure_message(&self, rec: &RecordHelper, message: &str, detail: &str) {
        let record = &rec.record;
        let located = format!(
            "{} at line {}, {}",
            record.filename.as_deref().unwrap_or(""),
            record.line_number,
            message
        );
        self.log()
            .log_detail(record.fac.as_deref(), &located, detail, MessageKind::Failed);
    }

    /// Fail the record when fewer than `min` parameters are present
    pub fn validate_param_size(&self, min: usize, rec: &mut RecordHelper) -> bool {
        if self.params.len() >= min {
            return true;
        }
        rec.record.status_code = StatusCode::GeneralScriptFailure;
        let command = rec.record.command.clone().unwrap_or_default();
        self.standard_failure_message(
            rec,
            &format!("Unable to perform {command}"),
            &format!(
                "wrong number of parameters: expected at least {min}, got {}",
                self.params.len()
            ),
        );
        false
    }

    /// Trimmed, unquoted token `index`, logging a failure when it is missing
    ///
    /// # Errors
    /// [`ProcessError::Fields`] when the record has no such field.
    pub fn required_field(
        &self,
        rec: &RecordHelper,
        index: usize,
        name: &'static str,
    ) -> Result<String, ProcessError> {
        rec.record
            .trimmed_unquoted_token(index)
            .map(str::to_string)
            .map_err(|source| {
                let err = ProcessError::fields(index, name, source);
                self.standard_failure_message(rec, &format!("missing {name} field"), &err.to_string());
                err
            })
    }

    /// Resolve `^name` tokens through the variable store
    ///
    /// Unset variables read as the empty string; other tokens are returned
    /// unchanged.
    ///
    /// # Errors
    /// Variable store failures.
    pub fn substitute_variable(&self, rec: &RecordHelper, token: &str) -> Result<String, VariableError> {
        match token.strip_prefix('^') {
            Some(name) => Ok(rec.variables().get(name.trim())?.unwrap_or_default()),
            None => Ok(token.to_string()),
        }
    }
}

/// Copy the record status into the `customStatusCode` variable
pub(crate) fn store_custom_status(rec: &RecordHelper) {
    let code = rec.record.status_code.code().to_string();
    if let Err(e) = rec.variables().set(CUSTOM_STATUS_CODE_VARIABLE, &code) {
        tracing::debug!("can't set {CUSTOM_STATUS_CODE_VARIABLE}: {e}");
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl Default for ProcessorBase {
    fn default() -> Self {
        Self::new(ProcessorServices::default())
    }
}

impl fmt::Debug for ProcessorBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorBase")
            .field("params", &self.params)
            .field("record_processed", &self.record_processed)
            .field("family", &self.family)
            .field("has_chained", &self.chained.is_some())
            .field("proc_instance_path", &self.proc_instance_path)
            .field("custom_proc_instance_path", &self.custom_proc_instance_path)
            .field("cached", &self.processor_map.len())
            .finish_non_exhaustive()
    }
}
