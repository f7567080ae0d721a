//! Top-level record dispatcher
//!
//! [`ProcessRequest`] holds one processor per record family plus optional
//! custom overrides and a list of extra processors. Each call to
//! [`ProcessRequest::do_request`] routes the current record through them in a
//! fixed order until one moves the status away from the sentinel:
//!
//! 1. driver command, test step, engine command
//! 2. extra processors, in list order
//! 3. custom driver command, custom test step, custom engine command

use crate::driver::DriverCommandProcessor;
use crate::engine::EngineCommandProcessor;
use crate::error::InitializationError;
use crate::helper::RecordHelper;
use crate::log::LogSink;
use crate::processor::{Processor, ProcessorServices};
use crate::test_step::TestStepProcessor;
use safs_record::StatusCode;
use std::fmt;
use std::iter;
use std::sync::Arc;

/// Processors for each family slot; `None` disables a slot
#[derive(Default)]
pub struct ProcessorSlots {
    /// Driver command processor
    pub driver: Option<Box<dyn Processor>>,
    /// Test step processor
    pub test_step: Option<Box<dyn Processor>>,
    /// Engine command processor
    pub engine: Option<Box<dyn Processor>>,
    /// Custom driver command processor
    pub custom_driver: Option<Box<dyn Processor>>,
    /// Custom test step processor
    pub custom_test_step: Option<Box<dyn Processor>>,
    /// Custom engine command processor
    pub custom_engine: Option<Box<dyn Processor>>,
}

impl ProcessorSlots {
    /// Driver command, test step and engine command processors
    #[must_use]
    pub fn standard(services: &ProcessorServices) -> Self {
        Self {
            driver: Some(Box::new(DriverCommandProcessor::new(services.clone()))),
            test_step: Some(Box::new(TestStepProcessor::new(services.clone()))),
            engine: Some(Box::new(EngineCommandProcessor::new(services.clone()))),
            ..Self::default()
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Processor>> {
        [
            &mut self.driver,
            &mut self.test_step,
            &mut self.engine,
            &mut self.custom_driver,
            &mut self.custom_test_step,
            &mut self.custom_engine,
        ]
        .into_iter()
        .flatten()
    }

    fn is_empty(&self) -> bool {
        [
            &self.driver,
            &self.test_step,
            &self.engine,
            &self.custom_driver,
            &self.custom_test_step,
            &self.custom_engine,
        ]
        .iter()
        .all(|slot| slot.is_none())
    }
}

impl fmt::Debug for ProcessorSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |slot: &Option<Box<dyn Processor>>| slot.as_ref().map(|p| p.name().to_string());
        f.debug_struct("ProcessorSlots")
            .field("driver", &name(&self.driver))
            .field("test_step", &name(&self.test_step))
            .field("engine", &name(&self.engine))
            .field("custom_driver", &name(&self.custom_driver))
            .field("custom_test_step", &name(&self.custom_test_step))
            .field("custom_engine", &name(&self.custom_engine))
            .finish()
    }
}

/// Routes one record at a time to the processor that claims it
#[derive(Default)]
pub struct ProcessRequest {
    record: Option<RecordHelper>,
    log: Option<Arc<dyn LogSink>>,
    slots: ProcessorSlots,
    processors: Vec<Box<dyn Processor>>,
    initialized: bool,
    ready: bool,
}

impl ProcessRequest {
    /// Dispatcher with the standard driver, test step and engine processors
    #[must_use]
    pub fn new(record: RecordHelper, log: Arc<dyn LogSink>, services: &ProcessorServices) -> Self {
        Self::with_processors(record, log, ProcessorSlots::standard(services))
    }

    /// Dispatcher with explicit family processors
    #[must_use]
    pub fn with_processors(record: RecordHelper, log: Arc<dyn LogSink>, slots: ProcessorSlots) -> Self {
        Self {
            record: Some(record),
            log: Some(log),
            slots,
            ..Self::default()
        }
    }

    /// Dispatcher using only `processors`; every family slot is empty
    #[must_use]
    pub fn with_processor_list(
        record: RecordHelper,
        log: Arc<dyn LogSink>,
        processors: Vec<Box<dyn Processor>>,
    ) -> Self {
        Self {
            record: Some(record),
            log: Some(log),
            processors,
            ..Self::default()
        }
    }

    /// Current record
    #[must_use]
    pub fn record(&self) -> Option<&RecordHelper> {
        self.record.as_ref()
    }

    /// Current record, mutably
    pub fn record_mut(&mut self) -> Option<&mut RecordHelper> {
        self.record.as_mut()
    }

    /// Replace the current record
    pub fn set_record(&mut self, record: RecordHelper) {
        self.record = Some(record);
    }

    /// Dispatcher log
    #[must_use]
    pub fn log(&self) -> Option<&Arc<dyn LogSink>> {
        self.log.as_ref()
    }

    /// Replace the dispatcher log
    pub fn set_log(&mut self, log: Arc<dyn LogSink>) {
        self.log = Some(log);
    }

    /// Family processors
    #[must_use]
    pub fn slots(&self) -> &ProcessorSlots {
        &self.slots
    }

    /// Family processors, mutably
    pub fn slots_mut(&mut self) -> &mut ProcessorSlots {
        &mut self.slots
    }

    /// Set or clear the driver command processor
    pub fn set_driver_processor(&mut self, processor: Option<Box<dyn Processor>>) {
        self.slots.driver = processor;
    }

    /// Set or clear the test step processor
    pub fn set_test_step_processor(&mut self, processor: Option<Box<dyn Processor>>) {
        self.slots.test_step = processor;
    }

    /// Set or clear the engine command processor
    pub fn set_engine_processor(&mut self, processor: Option<Box<dyn Processor>>) {
        self.slots.engine = processor;
    }

    /// Set or clear the custom driver command processor
    pub fn set_custom_driver_processor(&mut self, processor: Option<Box<dyn Processor>>) {
        self.slots.custom_driver = processor;
    }

    /// Set or clear the custom test step processor
    pub fn set_custom_test_step_processor(&mut self, processor: Option<Box<dyn Processor>>) {
        self.slots.custom_test_step = processor;
    }

    /// Set or clear the custom engine command processor
    pub fn set_custom_engine_processor(&mut self, processor: Option<Box<dyn Processor>>) {
        self.slots.custom_engine = processor;
    }

    /// Append an extra processor
    pub fn add_processor(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    /// Replace the extra processor list
    pub fn set_processor_list(&mut self, processors: Vec<Box<dyn Processor>>) {
        self.processors = processors;
    }

    /// Number of extra processors
    #[must_use]
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Whether the one-time cross-initialization has run
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Give every processor without a log the dispatcher log
    ///
    /// Runs on the first [`ProcessRequest::do_request`] if not called before;
    /// processors set afterwards are not touched again.
    pub fn initialize_requester(&mut self) {
        if let Some(log) = &self.log {
            let processors = self.slots.iter_mut().chain(self.processors.iter_mut());
            for processor in processors {
                if !processor.has_log() {
                    processor.set_log(Arc::clone(log));
                }
            }
        }
        self.initialized = true;
    }

    fn check_ready(&self) -> Result<(), InitializationError> {
        if self.record.is_none() {
            return Err(InitializationError::MissingRecord);
        }
        if self.log.is_none() {
            return Err(InitializationError::MissingLog);
        }
        if self.slots.is_empty() && self.processors.is_empty() {
            return Err(InitializationError::NoProcessors);
        }
        Ok(())
    }

    /// Route the current record
    ///
    /// Per-record problems only ever show up in the record's status; a record
    /// nobody claims keeps [`StatusCode::ScriptNotExecuted`].
    ///
    /// # Errors
    /// [`InitializationError`] when the record, the log or every processor
    /// is missing.
    pub fn do_request(&mut self) -> Result<(), InitializationError> {
        if !self.initialized {
            self.initialize_requester();
        }
        if !self.ready {
            if let Err(e) = self.check_ready() {
                tracing::error!("ProcessRequest: {e}");
                return Err(e);
            }
            self.ready = true;
        }

        let Self {
            record,
            slots,
            processors,
            ..
        } = self;
        let rec = record.as_mut().ok_or(InitializationError::MissingRecord)?;
        rec.record.status_code = StatusCode::ScriptNotExecuted;

        let record_type = match rec.record.trimmed_unquoted_token(0) {
            Ok(token) => token.to_uppercase(),
            Err(e) => {
                tracing::info!(
                    "ProcessRequest.doRequest: unsupported record format for this engine: [{}], \
                     or possibly you are using the wrong delimiter? {e}",
                    rec.record.input_record().unwrap_or("")
                );
                return Ok(());
            }
        };
        rec.record.record_type = Some(record_type.clone());

        let ProcessorSlots {
            driver,
            test_step,
            engine,
            custom_driver,
            custom_test_step,
            custom_engine,
        } = slots;
        let ordered = iter::once(driver)
            .chain([test_step, engine])
            .flatten()
            .chain(processors.iter_mut())
            .chain([custom_driver, custom_test_step, custom_engine].into_iter().flatten());
        for processor in ordered {
            if !rec.record.status_code.is_not_executed() {
                break;
            }
            try_processor(processor.as_mut(), rec, &record_type);
        }

        if rec.record.status_code.is_not_executed() {
            let message = format!(
                "ProcessRequest.doRequest: Unknown Command or Unsupported RecordType [{record_type}] for this engine."
            );
            if record_type.len() > 1 {
                tracing::info!("{message}");
            } else {
                tracing::debug!("{message}");
            }
        }
        Ok(())
    }
}

fn try_processor(processor: &mut dyn Processor, rec: &mut RecordHelper, record_type: &str) {
    if processor.is_supported_record_type(record_type) {
        tracing::debug!("{} processing {record_type} record", processor.name());
        processor.process(rec);
    }
}

impl fmt::Debug for ProcessRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extra: Vec<&str> = self.processors.iter().map(|p| p.name()).collect();
        f.debug_struct("ProcessRequest")
            .field("record", &self.record)
            .field("has_log", &self.log.is_some())
            .field("slots", &self.slots)
            .field("processors", &extra)
            .field("initialized", &self.initialized)
            .field("ready", &self.ready)
            .finish()
    }
}
