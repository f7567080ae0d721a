//! Test log collaborator

use std::fmt;

/// Kind of message written to the test log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Informational
    Generic,
    /// Action passed
    Passed,
    /// Action failed
    Failed,
    /// Action produced a warning
    Warning,
    /// Debug trace
    Debug,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generic => "GENERIC",
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Warning => "WARNING",
            Self::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// Destination for test log messages
///
/// `fac` is the log facility named by the record, if any.
pub trait LogSink: Send + Sync {
    /// Write one message
    fn log_message(&self, fac: Option<&str>, message: &str, kind: MessageKind);

    /// Write a message with a detail line
    fn log_detail(&self, fac: Option<&str>, message: &str, detail: &str, kind: MessageKind) {
        self.log_message(fac, &format!("{message}\n{detail}"), kind);
    }
}

/// [`LogSink`] that forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log_message(&self, fac: Option<&str>, message: &str, kind: MessageKind) {
        let fac = fac.unwrap_or("");
        match kind {
            MessageKind::Failed => tracing::error!(fac, "{message}"),
            MessageKind::Warning => tracing::warn!(fac, "{message}"),
            MessageKind::Debug => tracing::debug!(fac, "{message}"),
            MessageKind::Generic | MessageKind::Passed => {
                tracing::info!(fac, kind = %kind, "{message}");
            }
        }
    }
}
