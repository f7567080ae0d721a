//! Test step processor
//!
//! `T`, `TW` and `TF` records address a component of a window:
//! `T, window, component, action [, params...]`. The action is carried out by
//! a component function plugin named `CF<compType>`, looked up in the custom
//! package first, then in the engine package, with `CFComponent` as the
//! generic fallback.

use crate::config::BreakpointFamily;
use crate::error::ProcessError;
use crate::helper::RecordHelper;
use crate::log::MessageKind;
use crate::plugin::{qualify, qualify_custom, DEFAULT_PROCESSOR_PACKAGE};
use crate::processor::{panic_message, store_custom_status, Processor, ProcessorBase, ProcessorServices};
use safs_record::keywords;
use safs_record::StatusCode;
use std::panic::{self, AssertUnwindSafe};

/// Prefix of component function plugin names
pub const COMPONENT_FUNCTION_PREFIX: &str = "CF";

/// Component type used when the record names none
pub const DEFAULT_COMPONENT_TYPE: &str = "Component";

/// Processor for test step records
#[derive(Debug)]
pub struct TestStepProcessor {
    base: ProcessorBase,
}

impl TestStepProcessor {
    /// Create a test step processor
    #[must_use]
    pub fn new(services: ProcessorServices) -> Self {
        Self {
            base: ProcessorBase::new(services).with_family(BreakpointFamily::TestStep),
        }
    }

    /// Window (1), component (2), action (3), params (4..N)
    fn interpret_fields(&mut self, rec: &mut RecordHelper) -> Result<(), ProcessError> {
        let window = self.base.required_field(rec, 1, "windowName")?;
        let component = self.base.required_field(rec, 2, "compName")?;
        let command = self.base.required_field(rec, 3, "command")?;
        let count = rec
            .record
            .token_count()
            .map_err(|source| ProcessError::fields(0, "record", source))?;
        let params = (4..count)
            .map(|index| self.base.required_field(rec, index, "param"))
            .collect::<Result<Vec<_>, _>>()?;

        let record = &mut rec.record;
        record.window_name = Some(window);
        record.comp_name = Some(component);
        record.command = Some(command);
        self.base.set_params(params);
        Ok(())
    }

    fn comp_type(rec: &RecordHelper) -> &str {
        rec.record
            .comp_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_COMPONENT_TYPE)
    }

    /// `<custom>.CF<type>`, `<custom>.custom.CF<type>`
    fn custom_candidates(&self, class: &str) -> Vec<String> {
        self.base
            .custom_proc_instance_path()
            .map(|path| vec![qualify(path, class), qualify_custom(path, class)])
            .unwrap_or_default()
    }

    /// `<path>.CF<type>`, `<path>.CFComponent`
    fn subclass_candidates(&self, rec: &RecordHelper, class: &str) -> Vec<String> {
        let path = self
            .base
            .proc_instance_path()
            .or_else(|| rec.comp_instance_path())
            .unwrap_or(DEFAULT_PROCESSOR_PACKAGE);
        vec![
            qualify(path, class),
            qualify(path, &format!("{COMPONENT_FUNCTION_PREFIX}{DEFAULT_COMPONENT_TYPE}")),
        ]
    }

    fn run(&mut self, rec: &mut RecordHelper) -> Result<bool, ProcessError> {
        self.interpret_fields(rec)?;
        rec.record.status_code = StatusCode::ScriptNotExecuted;
        if self.base.check_breakpoints() {
            self.base.activate_breakpoint(rec);
        }

        let class = format!("{COMPONENT_FUNCTION_PREFIX}{}", Self::comp_type(rec));
        tracing::info!("Trying Custom Processors for {class}");
        let custom = self.custom_candidates(&class);
        if self.base.process_candidates(custom, rec) {
            return Ok(true);
        }
        tracing::info!("Trying SubClass Processors for {class}");
        let subclass = self.subclass_candidates(rec, &class);
        if self.base.process_candidates(subclass, rec) {
            return Ok(true);
        }
        self.base.process_chained(rec);
        Ok(self.base.is_record_processed() && !rec.record.status_code.is_not_executed())
    }

    fn location(rec: &RecordHelper) -> String {
        format!(
            "in table {} at line {}",
            rec.record.filename.as_deref().unwrap_or(""),
            rec.record.line_number
        )
    }
}

impl Processor for TestStepProcessor {
    fn name(&self) -> &str {
        "TestStepProcessor"
    }

    fn is_supported_record_type(&self, record_type: &str) -> bool {
        keywords::is_test_step_record(record_type)
    }

    fn process(&mut self, rec: &mut RecordHelper) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(rec)));
        let success = match outcome {
            Ok(Ok(true)) => true,
            Ok(Ok(false)) => {
                rec.record.status_code = StatusCode::ScriptNotExecuted;
                tracing::debug!("NO COMPONENT FUNCTION FOR: {:?}", rec.record.input_record());
                false
            }
            Ok(Err(err @ ProcessError::Fields { .. })) => {
                rec.record.status_code = StatusCode::GeneralScriptFailure;
                tracing::info!(
                    "SAFS Engine {} Functions did not properly execute {}: {err}",
                    Self::comp_type(rec),
                    Self::location(rec)
                );
                false
            }
            Ok(Err(err)) => {
                rec.record.status_code = StatusCode::ScriptNotExecuted;
                self.base.log_message(rec, &err.to_string(), MessageKind::Warning);
                false
            }
            Err(payload) => {
                rec.record.status_code = StatusCode::ScriptNotExecuted;
                let message = panic_message(payload.as_ref());
                self.base.log().log_detail(
                    rec.record.fac.as_deref(),
                    &format!("Unexpected Error: {message}"),
                    &format!("TestStepProcessor.process {}", Self::location(rec)),
                    MessageKind::Warning,
                );
                false
            }
        };
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProcessorConfig, ProcessorSettings};
    use crate::plugin::PluginRegistry;
    use safs_record::TestRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Component function that passes every action and records its params
    struct Passes {
        base: ProcessorBase,
        calls: Arc<AtomicUsize>,
    }

    impl Processor for Passes {
        fn name(&self) -> &str {
            "passes"
        }
        fn is_supported_record_type(&self, record_type: &str) -> bool {
            keywords::is_test_step_record(record_type)
        }
        fn process(&mut self, rec: &mut RecordHelper) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let info = self.base.params().join("+");
            rec.record.set_status(StatusCode::OK, info);
        }
        fn base(&self) -> &ProcessorBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ProcessorBase {
            &mut self.base
        }
    }

    fn register(registry: &mut PluginRegistry, name: &str) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry.register(name, move || Passes {
            base: ProcessorBase::default(),
            calls: counter.clone(),
        });
        calls
    }

    fn rec(line: &str) -> RecordHelper {
        let mut rec = RecordHelper::in_memory();
        rec.record = TestRecord::from_line(line, ",");
        rec
    }

    #[test]
    fn test_generic_component_function() {
        let mut registry = PluginRegistry::new();
        let calls = register(&mut registry, "org.safs.CFComponent");
        let mut p = TestStepProcessor::new(ProcessorServices::new().with_registry(registry));

        let mut r = rec("T,LoginWindow,UserField,SetText,admin");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::OK);
        assert_eq!(r.record.status_info.as_deref(), Some("admin"));
        assert_eq!(r.record.window_name.as_deref(), Some("LoginWindow"));
        assert_eq!(r.record.comp_name.as_deref(), Some("UserField"));
        assert_eq!(r.record.command.as_deref(), Some("SetText"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.variables().get("customStatusCode").unwrap().as_deref(), Some("-1"));
    }

    #[test]
    fn test_custom_component_type_preferred() {
        let mut registry = PluginRegistry::new();
        let custom = register(&mut registry, "org.acme.custom.CFTree");
        let generic = register(&mut registry, "org.safs.selenium.CFComponent");
        let settings = ProcessorSettings::from_config(
            &ProcessorConfig::new().with_custom_proc_instance_path("org.acme"),
        );
        let services = ProcessorServices::new()
            .with_registry(registry)
            .with_settings(Arc::new(settings));
        let mut p = TestStepProcessor::new(services);

        let mut r = rec("T,Main,Nav,Click").with_comp_instance_path("org.safs.selenium");
        r.record.comp_type = Some("Tree".into());
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::OK);
        assert_eq!(custom.load(Ordering::SeqCst), 1);
        assert_eq!(generic.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_fields_fail_the_step() {
        let mut p = TestStepProcessor::new(ProcessorServices::new());
        let mut r = rec("T,OnlyWindow");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::GeneralScriptFailure);
        assert_eq!(r.variables().get("customStatusCode").unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn test_no_component_function_is_not_executed() {
        let mut p = TestStepProcessor::new(ProcessorServices::new());
        let mut r = rec("TW,Main,Button,Click");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::ScriptNotExecuted);
        assert!(!p.is_record_processed());
    }
}
