//! Driver command processor
//!
//! Driver commands (`C`, `CW`, `CF` records) are tried against a fixed-order
//! chain of command families. File commands come first because `IfExistFile`
//! and `IfExistDir` wrap other file commands and must not be shadowed. When
//! no family recognizes the command, convention-named plugins are tried:
//! custom processors first, then the subclass processor for the engine.

pub mod command;
pub mod database;
pub mod file;
pub mod flow;
pub mod misc;
pub mod string;
pub mod timer;

use crate::config::BreakpointFamily;
use crate::error::ProcessError;
use crate::helper::RecordHelper;
use crate::log::MessageKind;
use crate::plugin::{qualify, qualify_custom};
use crate::processor::{panic_message, store_custom_status, Processor, ProcessorBase, ProcessorServices};
use database::DatabaseBackend;
use safs_record::keywords;
use safs_record::StatusCode;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Class name of driver command plugins
pub const DRIVER_COMMAND_CLASS: &str = "DCDriverCommand";

/// Registry name of the custom sub-chain processor
pub const CUSTOM_DRIVER_COMMAND: &str = "org.safs.custom.DCDriverCommand";

/// Position in the driver sub-chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubChain {
    /// File system commands
    File,
    /// Miscellaneous commands
    Misc,
    /// Database commands
    Database,
    /// String commands
    String,
    /// Flow control commands
    Flow,
    /// Timer commands
    Timer,
    /// Registered custom driver commands
    Custom,
}

impl SubChain {
    /// Sub-chain order
    pub const ORDER: [Self; 7] = [
        Self::File,
        Self::Misc,
        Self::Database,
        Self::String,
        Self::Flow,
        Self::Timer,
        Self::Custom,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

enum Slot {
    Pending,
    Ready(Box<dyn Processor>),
    Unavailable,
}

/// Processor for driver command records
pub struct DriverCommandProcessor {
    base: ProcessorBase,
    slots: [Slot; 7],
    database: Option<Arc<dyn DatabaseBackend>>,
    standard_enabled: bool,
}

impl DriverCommandProcessor {
    /// Create a driver command processor
    #[must_use]
    pub fn new(services: ProcessorServices) -> Self {
        Self {
            base: ProcessorBase::new(services).with_family(BreakpointFamily::Driver),
            slots: [
                Slot::Pending,
                Slot::Pending,
                Slot::Pending,
                Slot::Pending,
                Slot::Pending,
                Slot::Pending,
                Slot::Pending,
            ],
            database: None,
            standard_enabled: true,
        }
    }

    /// With database backend for the database family
    #[must_use]
    pub fn with_database(mut self, backend: Arc<dyn DatabaseBackend>) -> Self {
        self.database = Some(backend);
        if matches!(self.slots[SubChain::Database.index()], Slot::Ready(_)) {
            self.slots[SubChain::Database.index()] = Slot::Pending;
        }
        self
    }

    /// With a replacement sub-chain processor
    #[must_use]
    pub fn with_sub_processor(mut self, slot: SubChain, processor: Box<dyn Processor>) -> Self {
        self.set_sub_processor(slot, processor);
        self
    }

    /// Replace a sub-chain processor
    pub fn set_sub_processor(&mut self, slot: SubChain, processor: Box<dyn Processor>) {
        self.slots[slot.index()] = Slot::Ready(processor);
    }

    /// Turn the built-in sub-chain on or off
    pub fn set_standard_enabled(&mut self, enabled: bool) {
        self.standard_enabled = enabled;
    }

    /// Whether the built-in sub-chain is tried
    #[must_use]
    pub fn is_standard_enabled(&self) -> bool {
        self.standard_enabled
    }

    /// Whether the processor for `slot` has been created
    #[must_use]
    pub fn is_instantiated(&self, slot: SubChain) -> bool {
        matches!(self.slots[slot.index()], Slot::Ready(_))
    }

    fn create(&self, slot: SubChain) -> Option<Box<dyn Processor>> {
        let services = self.base.services().clone();
        match slot {
            SubChain::File => Some(Box::new(file::commands(services))),
            SubChain::Misc => Some(Box::new(misc::commands(services))),
            SubChain::Database => Some(Box::new(database::commands(services, self.database.clone()))),
            SubChain::String => Some(Box::new(string::commands(services))),
            SubChain::Flow => Some(Box::new(flow::commands(services))),
            SubChain::Timer => Some(Box::new(timer::commands(services))),
            SubChain::Custom => match self.base.registry().resolve(CUSTOM_DRIVER_COMMAND) {
                Ok(processor) => processor,
                Err(e) => {
                    tracing::warn!("{e}");
                    None
                }
            },
        }
    }

    fn ensure(&mut self, slot: SubChain) {
        if matches!(self.slots[slot.index()], Slot::Pending) {
            self.slots[slot.index()] = match self.create(slot) {
                Some(processor) => Slot::Ready(processor),
                None => Slot::Unavailable,
            };
        }
    }

    /// Command from token 1, parameters from tokens 2..N
    fn interpret_fields(&mut self, rec: &mut RecordHelper) -> Result<(), ProcessError> {
        let command = self.base.required_field(rec, 1, "command")?;
        rec.record.command = Some(command);
        let count = rec
            .record
            .token_count()
            .map_err(|source| ProcessError::fields(0, "record", source))?;
        let mut params = Vec::with_capacity(count.saturating_sub(2));
        for index in 2..count {
            params.push(self.base.required_field(rec, index, "param")?);
        }
        self.base.set_params(params);
        Ok(())
    }

    fn process_standard(&mut self, rec: &mut RecordHelper) -> bool {
        for slot in SubChain::ORDER {
            self.ensure(slot);
            if let Slot::Ready(processor) = &mut self.slots[slot.index()] {
                if self.base.init_and_process(processor.as_mut(), rec) {
                    tracing::debug!("{:?} sub-chain handled {:?}", slot, rec.record.command);
                    return true;
                }
            }
        }
        false
    }

    fn plugin_candidates(&self, rec: &RecordHelper) -> (Vec<String>, Vec<String>) {
        let registry = self.base.registry();
        let custom = self
            .base
            .custom_proc_instance_path()
            .map(|path| {
                vec![
                    qualify(path, DRIVER_COMMAND_CLASS),
                    qualify_custom(path, DRIVER_COMMAND_CLASS),
                ]
            })
            .unwrap_or_default();
        let subclass = self
            .base
            .proc_instance_path()
            .or_else(|| rec.comp_instance_path())
            .map(|path| vec![qualify(path, DRIVER_COMMAND_CLASS)])
            .unwrap_or_default();
        let valid = |names: Vec<String>| -> Vec<String> {
            names.into_iter().filter(|name| registry.is_valid(name)).collect()
        };
        (valid(custom), valid(subclass))
    }

    fn instantiate_and_process(&mut self, rec: &mut RecordHelper) -> bool {
        if self.standard_enabled && self.process_standard(rec) {
            return true;
        }
        let (custom, subclass) = self.plugin_candidates(rec);
        self.base.process_candidates(custom, rec) || self.base.process_candidates(subclass, rec)
    }

    fn run(&mut self, rec: &mut RecordHelper) -> Result<bool, ProcessError> {
        self.interpret_fields(rec)?;
        rec.record.status_code = StatusCode::ScriptNotExecuted;
        if self.base.check_breakpoints() {
            self.base.activate_breakpoint(rec);
        }
        Ok(self.instantiate_and_process(rec))
    }

    fn not_executed_detail(rec: &RecordHelper) -> String {
        format!(
            "DriverCommand {} did not properly execute in table {} at line {}",
            rec.record.command.as_deref().unwrap_or(""),
            rec.record.filename.as_deref().unwrap_or(""),
            rec.record.line_number
        )
    }
}

impl Processor for DriverCommandProcessor {
    fn name(&self) -> &str {
        "DriverCommandProcessor"
    }

    fn is_supported_record_type(&self, record_type: &str) -> bool {
        keywords::is_driver_command_record(record_type)
    }

    fn process(&mut self, rec: &mut RecordHelper) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(rec)));
        let success = match outcome {
            Ok(Ok(success)) => success,
            Ok(Err(err @ ProcessError::Fields { .. })) => {
                tracing::debug!("{}, {err}", Self::not_executed_detail(rec));
                false
            }
            Ok(Err(err)) => {
                tracing::debug!("{}, {err}", Self::not_executed_detail(rec));
                self.base
                    .log_message(rec, &format!("unexpected error: {err}"), MessageKind::Failed);
                false
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::debug!("{}, {message}", Self::not_executed_detail(rec));
                self.base.log().log_detail(
                    rec.record.fac.as_deref(),
                    &format!("Unexpected Error: {message}"),
                    "DriverCommandProcessor.process",
                    MessageKind::Warning,
                );
                false
            }
        };
        if !success {
            rec.record.status_code = StatusCode::ScriptNotExecuted;
        }
        self.base.set_record_processed(success);
        store_custom_status(rec);
    }

    fn base(&self) -> &ProcessorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessorBase {
        &mut self.base
    }
}

impl fmt::Debug for DriverCommandProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ready: Vec<SubChain> = SubChain::ORDER
            .into_iter()
            .filter(|slot| self.is_instantiated(*slot))
            .collect();
        f.debug_struct("DriverCommandProcessor")
            .field("base", &self.base)
            .field("instantiated", &ready)
            .field("has_database", &self.database.is_some())
            .field("standard_enabled", &self.standard_enabled)
            .finish()
    }
}
