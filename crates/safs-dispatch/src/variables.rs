//! Variable store collaborator
//!
//! Test tables exchange values through named variables. Names are
//! case-insensitive.

use crate::error::VariableError;
use dashmap::DashMap;

/// Named variable storage shared by the hook and its processors
pub trait VariableStore: Send + Sync {
    /// Read a variable; `Ok(None)` when it is not set
    ///
    /// # Errors
    /// Backend failures.
    fn get(&self, name: &str) -> Result<Option<String>, VariableError>;

    /// Write a variable
    ///
    /// # Errors
    /// Invalid names or backend failures.
    fn set(&self, name: &str, value: &str) -> Result<(), VariableError>;

    /// Remove every variable
    ///
    /// # Errors
    /// Backend failures.
    fn clear_all(&self) -> Result<(), VariableError>;
}

/// In-process [`VariableStore`]
#[derive(Debug, Default)]
pub struct MemoryVariables {
    values: DashMap<String, String>,
}

impl MemoryVariables {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of variables set
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variable is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn key(name: &str) -> Result<String, VariableError> {
        let key = name.trim();
        if key.is_empty() {
            return Err(VariableError::InvalidName(name.to_string()));
        }
        Ok(key.to_lowercase())
    }
}

impl VariableStore for MemoryVariables {
    fn get(&self, name: &str) -> Result<Option<String>, VariableError> {
        let key = Self::key(name)?;
        Ok(self.values.get(&key).map(|v| v.value().clone()))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), VariableError> {
        let key = Self::key(name)?;
        self.values.insert(key, value.to_string());
        Ok(())
    }

    fn clear_all(&self) -> Result<(), VariableError> {
        self.values.clear();
        Ok(())
    }
}
