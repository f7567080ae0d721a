//! Engine command processor
//!
//! `E` records query the GUI object cache through a [`GuiIntrospector`].
//! Every command answers with a single status info string: scalars verbatim
//! (empty becomes [`SAFS_NULL`]), lists in the self-describing multi-value
//! encoding, booleans as `true`/`false`.
//!
//! A command this processor does not know, a missing introspector or a
//! failing one all leave the record unprocessed, so the chained processor
//! and then the subclass processor get their turn.

use crate::config::ProcessorSettings;
use crate::error::ProcessError;
use crate::gui::{GuiIntrospector, GuiResult};
use crate::helper::RecordHelper;
use crate::processor::{Processor, ProcessorBase, ProcessorServices};
use safs_record::keywords::{self, engine};
use safs_record::{encode_multi_value, StatusCode, SAFS_NULL};
use std::fmt;
use std::sync::Arc;

/// What an engine command leaves in the record
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    /// `OK` with status info
    Info(String),
    /// `OK` without status info
    Done,
    /// Status stays at the sentinel for a subclass to fill in
    Deferred,
    /// `GENERAL_SCRIPT_FAILURE`, with the failure detail for the log
    Failed(String),
}

/// Arguments handed to an engine command
struct EngineCall<'a> {
    gui: &'a dyn GuiIntrospector,
    settings: &'a ProcessorSettings,
    params: &'a [String],
}

impl EngineCall<'_> {
    /// Parameter `index`; presence is checked against the table minimum
    fn param(&self, index: usize) -> &str {
        self.params.get(index).map_or("", String::as_str)
    }
}

type EngineHandler = fn(&EngineCall<'_>) -> GuiResult<Reply>;

/// Command name, minimum parameter count, handler
static COMMANDS: &[(&str, usize, EngineHandler)] = &[
    (engine::ENABLE_DOMAINS, 1, enable_domains),
    (engine::GET_DOMAIN_NAME, 1, get_domain_name),
    (engine::GET_CAPTION, 1, get_caption),
    (engine::GET_CHILD_COUNT, 1, get_child_count),
    (engine::GET_CHILDREN, 1, get_children),
    (engine::GET_CLASS_NAME, 1, get_class_name),
    (engine::GET_CLASS_INDEX, 1, get_class_index),
    (engine::GET_ID, 1, get_id),
    (engine::GET_LEVEL, 1, get_level),
    (engine::GET_MATCHING_CHILD_OBJECTS, 2, get_matching_child_objects),
    (engine::GET_MATCHING_PARENT_OBJECT, 1, get_matching_parent_object),
    (engine::GET_MATCHING_PATH_OBJECT, 2, get_matching_path_object),
    (engine::GET_NAME, 1, get_name),
    (engine::GET_ACCESSIBLE_NAME, 1, get_accessible_name),
    (engine::GET_NON_ACCESSIBLE_NAME, 1, get_non_accessible_name),
    (engine::GET_PROPERTY, 2, get_property),
    (engine::GET_PROPERTY_NAMES, 1, get_property_names),
    (engine::GET_STRING_DATA, 2, get_string_data),
    (engine::GET_SUPER_CLASS_NAMES, 1, get_super_class_names),
    (engine::GET_TEXT, 1, get_text),
    (engine::GET_TOP_LEVEL_COUNT, 0, get_top_level_count),
    (engine::GET_TOP_LEVEL_WINDOWS, 0, get_top_level_windows),
    (engine::IS_MATCHING_PATH, 2, is_matching_path),
    (engine::IS_SHOWING, 1, is_showing),
    (engine::IS_VALID, 1, is_valid),
    (engine::SET_ACTIVE_WINDOW, 1, set_active_window),
    (engine::IS_TOP_LEVEL_POPUP_CONTAINER, 1, is_top_level_popup_container),
    (engine::GET_OBJECT_RECOGNITION_AT_SCREEN_COORDS, 2, get_recognition_at),
];

/// Blank or missing scalars read as [`SAFS_NULL`]
fn scalar(value: Option<String>) -> Reply {
    match value {
        Some(value) if !value.trim().is_empty() => Reply::Info(value),
        _ => Reply::Info(SAFS_NULL.to_string()),
    }
}

/// Values that leave no free delimiter fail the command
fn list(values: &[String]) -> Reply {
    match encode_multi_value(values) {
        Ok(encoded) => Reply::Info(encoded),
        Err(e) => Reply::Failed(e.to_string()),
    }
}

fn flag(value: bool) -> Reply {
    Reply::Info(value.to_string())
}

fn enable_domains(call: &EngineCall<'_>) -> GuiResult<Reply> {
    let domains = call.param(0);
    call.settings.set_test_domains(domains);
    call.gui.enable_domains(domains)?;
    Ok(Reply::Done)
}

fn get_domain_name(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.domain_name(call.param(0)).map(scalar)
}

fn get_caption(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.caption(call.param(0)).map(scalar)
}

/// Counting caches the children; they are released again
fn get_child_count(call: &EngineCall<'_>) -> GuiResult<Reply> {
    let children = call.gui.children(call.param(0))?;
    call.gui.release(&children)?;
    Ok(Reply::Info(children.len().to_string()))
}

fn get_children(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.children(call.param(0)).map(|keys| list(&keys))
}

fn get_class_name(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.class_name(call.param(0)).map(scalar)
}

fn get_class_index(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.class_index(call.param(0)).map(scalar)
}

fn get_id(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.id(call.param(0)).map(scalar)
}

fn get_level(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui
        .level(call.param(0))
        .map(|level| Reply::Info(level.to_string()))
}

/// At most one child is returned, still list-encoded
fn get_matching_child_objects(call: &EngineCall<'_>) -> GuiResult<Reply> {
    let child = call.gui.matching_child_object(call.param(0), call.param(1))?;
    Ok(match child {
        Some(key) => list(&[key]),
        None => scalar(None),
    })
}

fn get_matching_parent_object(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.matching_parent_object(call.param(0)).map(scalar)
}

fn get_matching_path_object(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui
        .matching_path_object(call.param(0), call.param(1))
        .map(scalar)
}

/// Accessible name, else the toolkit name
fn get_name(call: &EngineCall<'_>) -> GuiResult<Reply> {
    let key = call.param(0);
    let name = match call.gui.accessible_name(key)? {
        Some(name) if !name.trim().is_empty() => Some(name),
        _ => call.gui.non_accessible_name(key)?,
    };
    Ok(scalar(name))
}

fn get_accessible_name(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.accessible_name(call.param(0)).map(scalar)
}

fn get_non_accessible_name(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.non_accessible_name(call.param(0)).map(scalar)
}

fn get_property(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.property(call.param(0), call.param(1)).map(scalar)
}

fn get_property_names(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.property_names(call.param(0)).map(|names| list(&names))
}

/// Engine specific; only subclass processors answer it
fn get_string_data(_call: &EngineCall<'_>) -> GuiResult<Reply> {
    Ok(Reply::Deferred)
}

fn get_super_class_names(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui
        .super_class_names(call.param(0))
        .map(|names| list(&names))
}

fn get_text(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.text(call.param(0)).map(scalar)
}

fn get_top_level_count(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui
        .top_level_windows()
        .map(|windows| Reply::Info(windows.len().to_string()))
}

fn get_top_level_windows(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.top_level_windows().map(|windows| list(&windows))
}

fn is_matching_path(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.is_matching_path(call.param(0), call.param(1)).map(flag)
}

fn is_showing(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.is_showing(call.param(0)).map(flag)
}

fn is_valid(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.is_valid(call.param(0)).map(flag)
}

fn set_active_window(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.set_active_window(call.param(0))?;
    Ok(Reply::Done)
}

fn is_top_level_popup_container(call: &EngineCall<'_>) -> GuiResult<Reply> {
    call.gui.is_top_level_popup_container(call.param(0)).map(flag)
}

/// Unparsable coordinates read as 0
fn get_recognition_at(call: &EngineCall<'_>) -> GuiResult<Reply> {
    let coord = |index: usize| {
        call.param(index).trim().parse::<i32>().unwrap_or_else(|e| {
            tracing::debug!("bad screen coordinate '{}': {e}", call.param(index));
            0
        })
    };
    call.gui.recognition_at(coord(0), coord(1)).map(scalar)
}

/// Processor for engine command records
pub struct EngineCommandProcessor {
    base: ProcessorBase,
    gui: Option<Arc<dyn GuiIntrospector>>,
}

impl EngineCommandProcessor {
    /// Create an engine command processor without GUI access
    #[must_use]
    pub fn new(services: ProcessorServices) -> Self {
        Self {
            base: ProcessorBase::new(services),
            gui: None,
        }
    }

    /// With GUI introspector
    #[must_use]
    pub fn with_gui(mut self, gui: Arc<dyn GuiIntrospector>) -> Self {
        self.gui = Some(gui);
        self
    }

    /// Replace the GUI introspector
    pub fn set_gui(&mut self, gui: Arc<dyn GuiIntrospector>) {
        self.gui = Some(gui);
    }

    /// Whether a GUI introspector is attached
    #[must_use]
    pub fn has_gui(&self) -> bool {
        self.gui.is_some()
    }

    /// Names of the built-in engine commands
    pub fn command_names() -> impl Iterator<Item = &'static str> {
        COMMANDS.iter().map(|(name, ..)| *name)
    }

    fn interpret_fields(&mut self, rec: &mut RecordHelper) -> Result<(), ProcessError> {
        let command = self.base.required_field(rec, 1, "command")?;
        rec.record.command = Some(command);
        let count = rec
            .record
            .token_count()
            .map_err(|source| ProcessError::fields(0, "record", source))?;
        let params = (2..count)
            .map(|index| self.base.required_field(rec, index, "param"))
            .collect::<Result<Vec<_>, _>>()?;
        self.base.set_params(params);
        Ok(())
    }

    /// Run a built-in command; `false` when the record is left to others
    fn dispatch(&self, rec: &mut RecordHelper) -> bool {
        let Some(command) = rec.record.command.clone() else {
            return false;
        };
        let Some(&(name, min, handler)) = COMMANDS
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(&command))
        else {
            return false;
        };
        tracing::info!("ECP.{name} processing...");
        if !self.base.validate_param_size(min, rec) {
            return true;
        }
        let Some(gui) = self.gui.as_deref() else {
            tracing::debug!("ECP.{name}: no GUI introspector attached");
            return false;
        };
        let call = EngineCall {
            gui,
            settings: self.base.settings(),
            params: self.base.params(),
        };
        match handler(&call) {
            Ok(Reply::Info(info)) => rec.record.set_status(StatusCode::OK, info),
            Ok(Reply::Done) => rec.record.status_code = StatusCode::OK,
            Ok(Reply::Deferred) => rec.record.status_code = StatusCode::ScriptNotExecuted,
            Ok(Reply::Failed(detail)) => {
                rec.record.status_code = StatusCode::GeneralScriptFailure;
                self.base
                    .standard_failure_message(rec, &format!("Unable to perform {name}"), &detail);
            }
            Err(e) => {
                tracing::debug!("ECP.{name} {e}");
                return false;
            }
        }
        true
    }
}

impl Processor for EngineCommandProcessor {
    fn name(&self) -> &str {
        "EngineCommandProcessor"
    }

    fn is_supported_record_type(&self, record_type: &str) -> bool {
        keywords::is_engine_command_record(record_type)
    }

    fn process(&mut self, rec: &mut RecordHelper) {
        tracing::info!("ECP.process testDomains: {}", self.base.settings().test_domains());
        let handled = match self.interpret_fields(rec) {
            Ok(()) => self.dispatch(rec),
            Err(e) => {
                tracing::debug!("ECP.process {e}");
                false
            }
        };
        self.base.set_record_processed(handled);
        if handled {
            return;
        }
        self.base.process_chained(rec);
        if !self.base.is_record_processed() {
            let names = self.base.proc_class_names();
            let processed = self.base.process_candidates(names, rec);
            self.base.set_record_processed(processed);
        }
    }

    fn base(&self) -> &ProcessorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessorBase {
        &mut self.base
    }
}

impl fmt::Debug for EngineCommandProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineCommandProcessor")
            .field("base", &self.base)
            .field("has_gui", &self.gui.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuiError;
    use crate::gui::MockGuiIntrospector;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use safs_record::{decode_multi_value, TestRecord};

    fn rec(line: &str) -> RecordHelper {
        let mut rec = RecordHelper::in_memory();
        rec.record = TestRecord::from_line(line, ",");
        rec
    }

    fn processor(gui: MockGuiIntrospector) -> EngineCommandProcessor {
        EngineCommandProcessor::new(ProcessorServices::new()).with_gui(Arc::new(gui))
    }

    #[test]
    fn test_too_few_params_never_reaches_gui() {
        // no expectations: any call panics
        let mut p = processor(MockGuiIntrospector::new());
        let mut r = rec("E,getProperty,key1");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::GeneralScriptFailure);
        assert!(p.is_record_processed());
    }

    #[test]
    fn test_scalar_result() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_property()
            .with(eq("key1"), eq("visible"))
            .times(1)
            .returning(|_, _| Ok(Some("true".into())));
        let mut p = processor(gui);
        let mut r = rec("E,GETPROPERTY,key1,visible");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::OK);
        assert_eq!(r.record.status_info.as_deref(), Some("true"));
    }

    #[test]
    fn test_blank_scalar_is_safs_null() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_caption().returning(|_| Ok(Some("  ".into())));
        let mut p = processor(gui);
        let mut r = rec("E,getCaption,win");
        p.process(&mut r);
        assert_eq!(r.record.status_info.as_deref(), Some(SAFS_NULL));
    }

    #[test]
    fn test_list_result_uses_unique_delimiter() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_children()
            .returning(|_| Ok(vec!["A".into(), "B,C".into()]));
        let mut p = processor(gui);
        let mut r = rec("E,getChildren,win");
        p.process(&mut r);
        let info = r.record.status_info.clone().unwrap();
        assert!(info.starts_with('|'));
        assert_eq!(decode_multi_value(&info), vec!["A", "B,C"]);
    }

    #[test]
    fn test_list_without_free_delimiter_fails() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_property_names()
            .returning(|_| Ok(vec!["a,|:;_#!".into(), "b".into()]));
        let mut p = processor(gui);
        let mut r = rec("E,getPropertyNames,win");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::GeneralScriptFailure);
        assert_eq!(r.record.status_info, None);
        assert!(p.is_record_processed());
    }

    #[test]
    fn test_child_count_releases_children() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_children()
            .returning(|_| Ok(vec!["k1".into(), "k2".into(), "k3".into()]));
        gui.expect_release()
            .withf(|keys| keys.len() == 3)
            .times(1)
            .returning(|_| Ok(()));
        let mut p = processor(gui);
        let mut r = rec("E,getChildCount,win");
        p.process(&mut r);
        assert_eq!(r.record.status_info.as_deref(), Some("3"));
    }

    #[test]
    fn test_enable_domains_updates_settings() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_enable_domains()
            .with(eq("Java,Html"))
            .times(1)
            .returning(|_| Ok(()));
        let mut p = processor(gui);
        let mut r = RecordHelper::in_memory();
        r.record = TestRecord::from_line("E|enableDomains|Java,Html", "|");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::OK);
        assert_eq!(p.base().settings().test_domains(), "Java,Html");
    }

    #[test]
    fn test_get_string_data_is_left_to_subclasses() {
        let mut p = processor(MockGuiIntrospector::new());
        let mut r = rec("E,getStringData,key,tree");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::ScriptNotExecuted);
        assert!(p.is_record_processed());
    }

    #[test]
    fn test_gui_error_falls_through() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_text()
            .returning(|key| Err(GuiError::UnknownKey(key.to_string())));
        let mut p = processor(gui);
        let mut r = rec("E,getText,stale");
        p.process(&mut r);
        assert_eq!(r.record.status_code, StatusCode::ScriptNotExecuted);
        assert!(!p.is_record_processed());
    }

    #[test]
    fn test_unknown_command_and_missing_gui() {
        let mut p = EngineCommandProcessor::new(ProcessorServices::new());
        let mut r = rec("E,noSuchCommand");
        p.process(&mut r);
        assert!(!p.is_record_processed());

        let mut r = rec("E,getText,key");
        p.process(&mut r);
        assert!(!p.is_record_processed());
        assert_eq!(r.record.status_code, StatusCode::ScriptNotExecuted);
    }

    #[test]
    fn test_top_level_commands_take_no_params() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_top_level_windows()
            .returning(|| Ok(vec!["w1".into(), "w2".into()]));
        let mut p = processor(gui);
        let mut r = rec("E,getTopLevelCount");
        p.process(&mut r);
        assert_eq!(r.record.status_info.as_deref(), Some("2"));

        let mut r = rec("E,getTopLevelWindows");
        p.process(&mut r);
        assert_eq!(r.record.status_info.as_deref(), Some(",w1,w2"));
    }

    #[test]
    fn test_bad_coordinates_read_as_zero() {
        let mut gui = MockGuiIntrospector::new();
        gui.expect_recognition_at()
            .with(eq(0), eq(15))
            .returning(|_, _| Ok(None));
        let mut p = processor(gui);
        let mut r = rec("E,getObjectRecognitionAtScreenCoords,x,15");
        p.process(&mut r);
        assert_eq!(r.record.status_info.as_deref(), Some(SAFS_NULL));
    }

    #[test]
    fn test_every_command_is_listed() {
        assert_eq!(EngineCommandProcessor::command_names().count(), 28);
    }
}
