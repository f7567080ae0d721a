//! Testing utilities for the SAFS dispatch workspace
//!
//! Shared fixtures: record builders, a log that remembers what it was told,
//! spy processors and a canned GUI introspector.

#![allow(missing_docs)]

use parking_lot::Mutex;
use safs_dispatch::{
    GuiError, GuiIntrospector, GuiResult, LogSink, MemoryVariables, MessageKind, Processor,
    ProcessorBase, RecordHelper, VariableStore,
};
use safs_record::{StatusCode, TestRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Record helper for `line` backed by a fresh in-memory store
pub fn record(line: &str, separator: &str) -> RecordHelper {
    let mut rec = RecordHelper::in_memory();
    rec.record = TestRecord::from_line(line, separator);
    rec
}

/// Record helper for `line` sharing `variables`
pub fn record_with_vars(line: &str, separator: &str, variables: Arc<MemoryVariables>) -> RecordHelper {
    RecordHelper::new(TestRecord::from_line(line, separator), variables)
}

/// Read a variable, panicking on store errors
pub fn var(rec: &RecordHelper, name: &str) -> Option<String> {
    rec.variables().get(name).unwrap()
}

/// One message written to a [`MemoryLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedMessage {
    pub fac: Option<String>,
    pub message: String,
    pub kind: MessageKind,
}

/// [`LogSink`] that keeps every message
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<LoggedMessage>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn messages(&self) -> Vec<LoggedMessage> {
        self.messages.lock().clone()
    }

    pub fn count(&self, kind: MessageKind) -> usize {
        self.messages.lock().iter().filter(|m| m.kind == kind).count()
    }

    /// Whether a message of `kind` contains `needle`
    pub fn contains(&self, kind: MessageKind, needle: &str) -> bool {
        self.messages
            .lock()
            .iter()
            .any(|m| m.kind == kind && m.message.contains(needle))
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl LogSink for MemoryLog {
    fn log_message(&self, fac: Option<&str>, message: &str, kind: MessageKind) {
        self.messages.lock().push(LoggedMessage {
            fac: fac.map(str::to_string),
            message: message.to_string(),
            kind,
        });
    }
}

/// Shared view of what a [`SpyProcessor`] saw
#[derive(Debug, Clone, Default)]
pub struct SpyHandle {
    calls: Arc<AtomicUsize>,
    log_sets: Arc<AtomicUsize>,
    last_params: Arc<Mutex<Vec<String>>>,
    last_command: Arc<Mutex<Option<String>>>,
}

impl SpyHandle {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn log_sets(&self) -> usize {
        self.log_sets.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Vec<String> {
        self.last_params.lock().clone()
    }

    pub fn last_command(&self) -> Option<String> {
        self.last_command.lock().clone()
    }
}

/// Processor with scripted behavior that records every call
///
/// By default it supports every record type, claims every record and sets
/// `OK`.
pub struct SpyProcessor {
    base: ProcessorBase,
    name: String,
    record_types: Option<Vec<String>>,
    command: Option<String>,
    status: StatusCode,
    handle: SpyHandle,
}

impl SpyProcessor {
    pub fn new(name: &str) -> Self {
        Self {
            base: ProcessorBase::default(),
            name: name.to_string(),
            record_types: None,
            command: None,
            status: StatusCode::OK,
            handle: SpyHandle::default(),
        }
    }

    /// Only support these record types
    #[must_use]
    pub fn supporting(mut self, record_types: &[&str]) -> Self {
        self.record_types = Some(record_types.iter().map(|t| t.to_uppercase()).collect());
        self
    }

    /// Only claim records whose command matches, ignoring case
    #[must_use]
    pub fn claiming(mut self, command: &str) -> Self {
        self.command = Some(command.to_string());
        self
    }

    /// Status set on claimed records
    #[must_use]
    pub fn setting(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn handle(&self) -> SpyHandle {
        self.handle.clone()
    }

    pub fn boxed(self) -> (Box<dyn Processor>, SpyHandle) {
        let handle = self.handle();
        (Box::new(self), handle)
    }
}

impl Processor for SpyProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_supported_record_type(&self, record_type: &str) -> bool {
        self.record_types
            .as_ref()
            .map_or(true, |types| types.iter().any(|t| t.eq_ignore_ascii_case(record_type.trim())))
    }

    fn process(&mut self, rec: &mut RecordHelper) {
        self.handle.calls.fetch_add(1, Ordering::SeqCst);
        *self.handle.last_params.lock() = self.base.params().to_vec();
        *self.handle.last_command.lock() = rec.record.command.clone();

        let claimed = match (&self.command, rec.record.command.as_deref()) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            (Some(_), None) => false,
        };
        if claimed {
            rec.record.status_code = self.status;
        }
        self.base.set_record_processed(claimed);
    }

    fn base(&self) -> &ProcessorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProcessorBase {
        &mut self.base
    }

    fn set_log(&mut self, log: Arc<dyn LogSink>) {
        self.handle.log_sets.fetch_add(1, Ordering::SeqCst);
        self.base.set_log(log);
    }
}

/// Canned GUI object cache keyed by component key
#[derive(Debug, Default)]
pub struct StubGui {
    pub texts: HashMap<String, String>,
    pub children: HashMap<String, Vec<String>>,
    pub windows: Vec<String>,
    calls: AtomicUsize,
}

impl StubGui {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(mut self, key: &str, text: &str) -> Self {
        self.texts.insert(key.to_string(), text.to_string());
        self
    }

    #[must_use]
    pub fn with_children(mut self, key: &str, children: &[&str]) -> Self {
        self.children
            .insert(key.to_string(), children.iter().map(|c| (*c).to_string()).collect());
        self
    }

    #[must_use]
    pub fn with_windows(mut self, windows: &[&str]) -> Self {
        self.windows = windows.iter().map(|w| (*w).to_string()).collect();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn known(&self, key: &str) -> GuiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.texts.contains_key(key) || self.children.contains_key(key) || self.windows.iter().any(|w| w == key) {
            Ok(())
        } else {
            Err(GuiError::UnknownKey(key.to_string()))
        }
    }
}

impl GuiIntrospector for StubGui {
    fn enable_domains(&self, _domains: &str) -> GuiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn domain_name(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(Some("Java".into()))
    }

    fn caption(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(self.texts.get(key).cloned())
    }

    fn children(&self, key: &str) -> GuiResult<Vec<String>> {
        self.known(key)?;
        Ok(self.children.get(key).cloned().unwrap_or_default())
    }

    fn release(&self, _keys: &[String]) -> GuiResult<()> {
        Ok(())
    }

    fn class_name(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(Some("javax.swing.JPanel".into()))
    }

    fn class_index(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(Some("1".into()))
    }

    fn id(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(None)
    }

    fn level(&self, key: &str) -> GuiResult<i32> {
        self.known(key)?;
        Ok(0)
    }

    fn matching_child_object(&self, parent: &str, _recognition: &str) -> GuiResult<Option<String>> {
        self.known(parent)?;
        Ok(self.children.get(parent).and_then(|kids| kids.first().cloned()))
    }

    fn matching_parent_object(&self, _recognition: &str) -> GuiResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.windows.first().cloned())
    }

    fn matching_path_object(&self, key: &str, _path: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(None)
    }

    fn accessible_name(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(None)
    }

    fn non_accessible_name(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(Some(key.to_string()))
    }

    fn property(&self, key: &str, name: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok((name.eq_ignore_ascii_case("text")).then(|| self.texts.get(key).cloned()).flatten())
    }

    fn property_names(&self, key: &str) -> GuiResult<Vec<String>> {
        self.known(key)?;
        Ok(vec!["text".into()])
    }

    fn super_class_names(&self, key: &str) -> GuiResult<Vec<String>> {
        self.known(key)?;
        Ok(vec!["javax.swing.JComponent".into(), "java.awt.Container".into()])
    }

    fn text(&self, key: &str) -> GuiResult<Option<String>> {
        self.known(key)?;
        Ok(self.texts.get(key).cloned())
    }

    fn top_level_windows(&self) -> GuiResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.windows.clone())
    }

    fn is_matching_path(&self, key: &str, _path: &str) -> GuiResult<bool> {
        self.known(key)?;
        Ok(false)
    }

    fn is_showing(&self, key: &str) -> GuiResult<bool> {
        self.known(key)?;
        Ok(true)
    }

    fn is_valid(&self, key: &str) -> GuiResult<bool> {
        Ok(self.known(key).is_ok())
    }

    fn set_active_window(&self, key: &str) -> GuiResult<()> {
        self.known(key)
    }

    fn is_top_level_popup_container(&self, key: &str) -> GuiResult<bool> {
        self.known(key)?;
        Ok(false)
    }

    fn recognition_at(&self, _x: i32, _y: i32) -> GuiResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}
