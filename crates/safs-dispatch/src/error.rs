//! Error types for record dispatch
//!
//! Only [`InitializationError`] ever leaves [`crate::ProcessRequest::do_request`];
//! everything else is converted to a status code at a processor boundary.

use safs_record::RecordError;

/// Fatal setup defect detected by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitializationError {
    /// No record has been attached to the request
    #[error("no test record available for request")]
    MissingRecord,

    /// No log collaborator has been attached to the request
    #[error("no log available for request")]
    MissingLog,

    /// Every processor slot is empty
    #[error("No Processors available for request!")]
    NoProcessors,
}

/// Failures inside a processor, converted to status by the processor itself
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Record fields could not be interpreted
    #[error("field #{field} ({name}) error processing input record: {source}")]
    Fields {
        field: usize,
        name: &'static str,
        #[source]
        source: RecordError,
    },

    /// Variable store failed
    #[error(transparent)]
    Variables(#[from] VariableError),

    /// Plugin could not be created
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// GUI collaborator failed
    #[error(transparent)]
    Gui(#[from] GuiError),

    /// Required collaborator is not configured
    #[error("{0} is not configured")]
    Unavailable(&'static str),
}

impl ProcessError {
    /// Field interpretation error for token `field`
    pub fn fields(field: usize, name: &'static str, source: RecordError) -> Self {
        Self::Fields {
            field,
            name,
            source,
        }
    }
}

/// Variable store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariableError {
    /// Variable name is empty or malformed
    #[error("invalid variable name: '{0}'")]
    InvalidName(String),

    /// Backing store rejected the operation
    #[error("variable store error: {0}")]
    Store(String),
}

/// Plugin resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// Factory refused to build the processor
    #[error("can't instantiate processor '{name}': {reason}")]
    Instantiation { name: String, reason: String },
}

/// GUI collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuiError {
    /// Component key is not in the GUI object cache
    #[error("no cached GUI object for key '{0}'")]
    UnknownKey(String),

    /// Automation backend failed
    #[error("GUI backend error: {0}")]
    Backend(String),
}

/// Database collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseError {
    /// Connection or driver problem
    #[error("database connection error: {0}")]
    Connection(String),

    /// Query was rejected
    #[error("query failed: {0}")]
    Query(String),
}

/// Failure of a single driver command, reported through the record status
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Not enough parameters were supplied
    #[error("wrong number of parameters: expected at least {expected}, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    /// A parameter had an unusable value
    #[error("invalid parameter value: {0}")]
    ParameterValue(String),

    /// File system operation failed
    #[error("file error on '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Action could not be performed
    #[error("{0}")]
    Action(String),

    /// Variable store failed
    #[error(transparent)]
    Variables(#[from] VariableError),

    /// Database collaborator failed
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl CommandError {
    /// Create file error for path
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
