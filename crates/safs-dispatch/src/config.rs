//! Processor configuration and shared runtime settings

use crate::log::{LogSink, MessageKind};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Default test domains
pub const DEFAULT_TEST_DOMAINS: &str = "Html;Java;Swt;Net;Win;Flex";

/// Default seconds to wait for a window or component
pub const DEFAULT_SECS_WAIT: u32 = 30;

/// Static processor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Package prefix searched for subclass processors
    pub proc_instance_path: Option<String>,
    /// Package prefix searched for custom processors
    pub custom_proc_instance_path: Option<String>,
    /// Seconds to wait for a window
    pub secs_wait_for_window: u32,
    /// Seconds to wait for a component
    pub secs_wait_for_component: u32,
    /// Enabled test domains
    pub test_domains: String,
    /// Breakpoints honored when running from the command line
    pub command_line_breakpoint: bool,
    /// Global breakpoints switch
    pub breakpoints: bool,
    /// Driver command breakpoints switch
    pub driver_breakpoints: bool,
    /// Test step breakpoints switch
    pub test_step_breakpoints: bool,
}

impl ProcessorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With subclass processor path
    #[inline]
    #[must_use]
    pub fn with_proc_instance_path(mut self, path: impl Into<String>) -> Self {
        self.proc_instance_path = Some(path.into());
        self
    }

    /// With custom processor path
    #[inline]
    #[must_use]
    pub fn with_custom_proc_instance_path(mut self, path: impl Into<String>) -> Self {
        self.custom_proc_instance_path = Some(path.into());
        self
    }

    /// With test domains
    #[inline]
    #[must_use]
    pub fn with_test_domains(mut self, domains: impl Into<String>) -> Self {
        self.test_domains = domains.into();
        self
    }

    /// With the global breakpoints switch
    #[inline]
    #[must_use]
    pub fn with_breakpoints(mut self, on: bool) -> Self {
        self.breakpoints = on;
        self
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            proc_instance_path: None,
            custom_proc_instance_path: None,
            secs_wait_for_window: DEFAULT_SECS_WAIT,
            secs_wait_for_component: DEFAULT_SECS_WAIT,
            test_domains: DEFAULT_TEST_DOMAINS.to_string(),
            command_line_breakpoint: false,
            breakpoints: false,
            driver_breakpoints: false,
            test_step_breakpoints: false,
        }
    }
}

/// Which family-level breakpoint switch applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointFamily {
    /// Only the global switch
    None,
    /// Driver commands
    Driver,
    /// Test steps
    TestStep,
}

/// Runtime settings shared by every processor of one dispatcher
#[derive(Debug)]
pub struct ProcessorSettings {
    breakpoints: AtomicBool,
    driver_breakpoints: AtomicBool,
    test_step_breakpoints: AtomicBool,
    command_debug: AtomicBool,
    test_debug: AtomicBool,
    secs_wait_for_window: AtomicU32,
    secs_wait_for_component: AtomicU32,
    test_domains: RwLock<String>,
    proc_instance_path: Option<String>,
    custom_proc_instance_path: Option<String>,
    command_line_breakpoint: bool,
}

impl ProcessorSettings {
    /// Build runtime settings from configuration
    #[must_use]
    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self {
            breakpoints: AtomicBool::new(config.breakpoints),
            driver_breakpoints: AtomicBool::new(config.driver_breakpoints),
            test_step_breakpoints: AtomicBool::new(config.test_step_breakpoints),
            command_debug: AtomicBool::new(false),
            test_debug: AtomicBool::new(false),
            secs_wait_for_window: AtomicU32::new(config.secs_wait_for_window),
            secs_wait_for_component: AtomicU32::new(config.secs_wait_for_component),
            test_domains: RwLock::new(config.test_domains.clone()),
            proc_instance_path: config.proc_instance_path.clone(),
            custom_proc_instance_path: config.custom_proc_instance_path.clone(),
            command_line_breakpoint: config.command_line_breakpoint,
        }
    }

    /// Shared handle with default settings
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Global breakpoints switch
    #[inline]
    #[must_use]
    pub fn breakpoints(&self) -> bool {
        self.breakpoints.load(Ordering::Relaxed)
    }

    /// Set the global breakpoints switch
    pub fn set_breakpoints(&self, on: bool) {
        self.breakpoints.store(on, Ordering::Relaxed);
    }

    /// Family breakpoints switch
    #[must_use]
    pub fn family_breakpoints(&self, family: BreakpointFamily) -> bool {
        match family {
            BreakpointFamily::None => false,
            BreakpointFamily::Driver => self.driver_breakpoints.load(Ordering::Relaxed),
            BreakpointFamily::TestStep => self.test_step_breakpoints.load(Ordering::Relaxed),
        }
    }

    /// Set a family breakpoints switch
    pub fn set_family_breakpoints(&self, family: BreakpointFamily, on: bool) {
        match family {
            BreakpointFamily::None => {}
            BreakpointFamily::Driver => self.driver_breakpoints.store(on, Ordering::Relaxed),
            BreakpointFamily::TestStep => self.test_step_breakpoints.store(on, Ordering::Relaxed),
        }
    }

    /// Whether breakpoints are honored when running from the command line
    #[inline]
    #[must_use]
    pub fn command_line_breakpoint(&self) -> bool {
        self.command_line_breakpoint
    }

    /// Command debug switch
    #[inline]
    #[must_use]
    pub fn command_debug(&self) -> bool {
        self.command_debug.load(Ordering::Relaxed)
    }

    /// Set the command debug switch
    pub fn set_command_debug(&self, on: bool) {
        self.command_debug.store(on, Ordering::Relaxed);
    }

    /// Test debug switch
    #[inline]
    #[must_use]
    pub fn test_debug(&self) -> bool {
        self.test_debug.load(Ordering::Relaxed)
    }

    /// Set the test debug switch
    pub fn set_test_debug(&self, on: bool) {
        self.test_debug.store(on, Ordering::Relaxed);
    }

    /// Seconds to wait for a window
    #[inline]
    #[must_use]
    pub fn secs_wait_for_window(&self) -> u32 {
        self.secs_wait_for_window.load(Ordering::Relaxed)
    }

    /// Seconds to wait for a component
    #[inline]
    #[must_use]
    pub fn secs_wait_for_component(&self) -> u32 {
        self.secs_wait_for_component.load(Ordering::Relaxed)
    }

    /// Enabled test domains
    #[must_use]
    pub fn test_domains(&self) -> String {
        self.test_domains.read().clone()
    }

    /// Replace the enabled test domains
    pub fn set_test_domains(&self, domains: &str) {
        *self.test_domains.write() = domains.to_string();
    }

    /// Configured subclass processor path
    #[must_use]
    pub fn proc_instance_path(&self) -> Option<&str> {
        self.proc_instance_path.as_deref()
    }

    /// Configured custom processor path
    #[must_use]
    pub fn custom_proc_instance_path(&self) -> Option<&str> {
        self.custom_proc_instance_path.as_deref()
    }
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self::from_config(&ProcessorConfig::default())
    }
}

/// Action taken when a breakpoint fires
pub trait BreakpointHandler: Send + Sync {
    /// Called with a description of the record about to run
    fn activate(&self, message: &str, log: Option<&dyn LogSink>);
}

/// Logs the breakpoint and continues
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBreakpoint;

impl BreakpointHandler for LogBreakpoint {
    fn activate(&self, message: &str, log: Option<&dyn LogSink>) {
        tracing::info!("breakpoint: {message}");
        if let Some(log) = log {
            log.log_message(None, &format!("BREAKPOINT: {message}"), MessageKind::Generic);
        }
    }
}
