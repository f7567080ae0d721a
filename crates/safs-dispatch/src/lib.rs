//! SAFS Record Dispatch
//!
//! Routes keyword-driven test records to the processor that claims them.
//!
//! # Core Concepts
//!
//! - [`ProcessRequest`]: top-level dispatcher trying processor slots in a
//!   fixed order until the record status leaves the sentinel
//! - [`Processor`]: contract every record processor fulfills, with shared
//!   state in [`ProcessorBase`]
//! - [`DriverCommandProcessor`]: `C` records, tried against the file, misc,
//!   database, string, flow, timer and custom command families in that order
//! - [`TestStepProcessor`]: `T` records, delegated to component function plugins
//! - [`EngineCommandProcessor`]: `E` records, answered by a [`GuiIntrospector`]
//! - [`PluginRegistry`]: convention-named processor plugins (`org.safs.DCDriverCommand`)
//! - [`RecordHelper`]: the record plus the variable store it is exchanged through
//!
//! # Example
//!
//! ```rust
//! use safs_dispatch::{ProcessRequest, ProcessorServices, RecordHelper, TracingLog};
//! use safs_record::{StatusCode, TestRecord};
//! use std::sync::Arc;
//!
//! let mut rec = RecordHelper::in_memory();
//! rec.record = TestRecord::from_line("C, SetVariableValues, greeting=hello", ",");
//!
//! let services = ProcessorServices::new();
//! let mut request = ProcessRequest::new(rec, Arc::new(TracingLog), &services);
//! request.do_request().unwrap();
//!
//! let rec = request.record().unwrap();
//! assert_eq!(rec.record.status_code, StatusCode::OK);
//! assert_eq!(rec.variables().get("greeting").unwrap().as_deref(), Some("hello"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod config;
mod engine;
mod error;
mod gui;
mod helper;
mod log;
mod plugin;
mod processor;
mod request;
mod test_step;
mod variables;

/// Driver command processor and its command families
pub mod driver;

// Re-exports
pub use config::{
    BreakpointFamily, BreakpointHandler, LogBreakpoint, ProcessorConfig, ProcessorSettings,
    DEFAULT_SECS_WAIT, DEFAULT_TEST_DOMAINS,
};
pub use driver::database::{DataSource, DatabaseBackend};
pub use driver::{DriverCommandProcessor, SubChain};
pub use engine::EngineCommandProcessor;
pub use error::{
    CommandError, DatabaseError, GuiError, InitializationError, PluginError, ProcessError,
    VariableError,
};
pub use gui::{GuiIntrospector, GuiResult};
pub use helper::{vars, RecordHelper, DEFAULT_INSTANCE_NAME};
pub use log::{LogSink, MessageKind, TracingLog};
pub use plugin::{
    is_qualified_name, qualify, qualify_custom, PluginRegistry, ProcessorFactory,
    CUSTOM_PROCESSOR_SUBPACKAGE, DEFAULT_CUSTOM_PROCESSOR_PACKAGE, DEFAULT_PROCESSOR_PACKAGE,
};
pub use processor::{Processor, ProcessorBase, ProcessorServices};
pub use request::{ProcessRequest, ProcessorSlots};
pub use test_step::{TestStepProcessor, COMPONENT_FUNCTION_PREFIX, DEFAULT_COMPONENT_TYPE};
pub use variables::{MemoryVariables, VariableStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items
pub mod prelude {
    pub use crate::{
        LogSink, MessageKind, ProcessRequest, Processor, ProcessorBase, ProcessorServices,
        RecordHelper, VariableStore,
    };
    pub use safs_record::{StatusCode, TestRecord};
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use safs_record::{StatusCode, TestRecord};
    use std::sync::Arc;

    fn request(line: &str) -> ProcessRequest {
        let mut rec = RecordHelper::in_memory();
        rec.record = TestRecord::from_line(line, ",");
        ProcessRequest::new(rec, Arc::new(TracingLog), &ProcessorServices::new())
    }

    fn status(request: &ProcessRequest) -> StatusCode {
        request.record().map(|r| r.record.status_code).unwrap_or_default()
    }

    #[test]
    fn test_driver_command_end_to_end() {
        let mut request = request("C, ToUpperCase, mixed Case, result");
        request.do_request().unwrap();
        assert_eq!(status(&request), StatusCode::OK);
        let rec = request.record().unwrap();
        assert_eq!(rec.variables().get("result").unwrap().as_deref(), Some("MIXED CASE"));
        assert_eq!(rec.record.record_type.as_deref(), Some("C"));
    }

    #[test]
    fn test_same_request_serves_many_records() {
        let mut request = request("C, SetVariableValueEx, counter, 1");
        request.do_request().unwrap();
        assert_eq!(status(&request), StatusCode::OK);

        let rec = request.record_mut().unwrap();
        rec.record.reinit();
        rec.record.set_input_record("C; OnEqualGotoBlockID; Done; ^counter; 1");
        rec.record.set_separator(";");
        request.do_request().unwrap();
        assert_eq!(status(&request), StatusCode::BranchToBlockId);
        assert_eq!(
            request.record().unwrap().record.status_info.as_deref(),
            Some("Done")
        );
    }

    #[test]
    fn test_unknown_record_type_stays_unexecuted() {
        let mut request = request("Q, whatever");
        request.do_request().unwrap();
        assert_eq!(status(&request), StatusCode::ScriptNotExecuted);
    }

    #[test]
    fn test_engine_record_without_gui_is_unexecuted() {
        let mut request = request("E, getText, key");
        request.do_request().unwrap();
        assert_eq!(status(&request), StatusCode::ScriptNotExecuted);
    }
}
