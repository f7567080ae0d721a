//! Plugin registry for convention-named processors
//!
//! Processors that extend the built-in keyword vocabularies are registered
//! under fully qualified names such as `org.safs.custom.DCDriverCommand` and
//! resolved by name when a built-in processor does not recognize a record.

use crate::error::PluginError;
use crate::processor::Processor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Root package of the standard processors
pub const DEFAULT_PROCESSOR_PACKAGE: &str = "org.safs";

/// Root package of user supplied processors
pub const DEFAULT_CUSTOM_PROCESSOR_PACKAGE: &str = "org.safs.custom";

/// Sub-package appended to a path when searching for custom processors
pub const CUSTOM_PROCESSOR_SUBPACKAGE: &str = "custom";

/// Builds a fresh processor instance
pub type ProcessorFactory = Arc<dyn Fn() -> Result<Box<dyn Processor>, PluginError> + Send + Sync>;

/// Registry mapping fully qualified names to processor factories
#[derive(Default, Clone)]
pub struct PluginRegistry {
    factories: HashMap<String, ProcessorFactory>,
}

impl PluginRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register an infallible factory
    pub fn register<F, P>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Processor + 'static,
    {
        self.factories.insert(
            name.to_string(),
            Arc::new(move || Ok(Box::new(factory()) as Box<dyn Processor>)),
        );
    }

    /// Register a factory that may refuse to build
    pub fn register_fallible(&mut self, name: &str, factory: ProcessorFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Check if a factory exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Remove a factory
    #[inline]
    pub fn remove(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    /// List all registered names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get number of registered factories
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Whether `name` is a well-formed dotted name with a registered factory
    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        is_qualified_name(name) && self.contains(name)
    }

    /// Build the processor registered under `name`
    ///
    /// # Errors
    /// The factory refused to build.
    pub fn resolve(&self, name: &str) -> Result<Option<Box<dyn Processor>>, PluginError> {
        match self.factories.get(name) {
            Some(factory) => factory().map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Dotted identifier such as `org.safs.custom.DCDriverCommand`
#[must_use]
pub fn is_qualified_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

/// `<path>.<class>`, or `<class>` when `path` is empty
#[must_use]
pub fn qualify(path: &str, class: &str) -> String {
    let path = path.trim_end_matches('.');
    if path.is_empty() {
        class.to_string()
    } else {
        format!("{path}.{class}")
    }
}

/// `<path>.custom.<class>`
#[must_use]
pub fn qualify_custom(path: &str, class: &str) -> String {
    qualify(&qualify(path, CUSTOM_PROCESSOR_SUBPACKAGE), class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_names() {
        assert!(is_qualified_name("org.safs.DCDriverCommand"));
        assert!(is_qualified_name("Single"));
        assert!(is_qualified_name("org.safs.Outer$Inner"));
        assert!(!is_qualified_name(""));
        assert!(!is_qualified_name("org..safs"));
        assert!(!is_qualified_name("org.safs."));
        assert!(!is_qualified_name("org.9safs"));
        assert!(!is_qualified_name("org.sa fs"));
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("org.safs", "DCDriverCommand"), "org.safs.DCDriverCommand");
        assert_eq!(qualify("org.safs.", "CFButton"), "org.safs.CFButton");
        assert_eq!(qualify("", "CFButton"), "CFButton");
        assert_eq!(
            qualify_custom("org.safs.selenium", "DCDriverCommand"),
            "org.safs.selenium.custom.DCDriverCommand"
        );
    }

    #[test]
    fn test_unregistered_name_is_invalid() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.is_valid("org.safs.DCDriverCommand"));
        assert!(registry.resolve("org.safs.DCDriverCommand").unwrap().is_none());
    }

    #[test]
    fn test_fallible_factory() {
        let mut registry = PluginRegistry::new();
        registry.register_fallible(
            "org.safs.Broken",
            Arc::new(|| {
                Err(PluginError::Instantiation {
                    name: "org.safs.Broken".into(),
                    reason: "no backend".into(),
                })
            }),
        );
        assert!(registry.is_valid("org.safs.Broken"));
        assert!(registry.resolve("org.safs.Broken").is_err());
        assert!(registry.remove("org.safs.Broken"));
        assert_eq!(registry.len(), 0);
    }
}
