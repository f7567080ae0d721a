//! GUI introspection collaborator
//!
//! Engine commands address GUI objects by string keys handed out by the
//! automation backend. Object recognition itself lives behind this trait.

use crate::error::GuiError;

/// Result type for GUI queries
pub type GuiResult<T> = Result<T, GuiError>;

/// Backend-neutral view of the GUI object cache
///
/// Scalar queries return `Ok(None)` when the object has no such value;
/// list queries return cache keys or plain strings.
#[cfg_attr(test, mockall::automock)]
pub trait GuiIntrospector: Send + Sync {
    /// Enable the given test domains (for example `"Java,Html"`)
    fn enable_domains(&self, domains: &str) -> GuiResult<()>;

    /// Domain owning the object
    fn domain_name(&self, key: &str) -> GuiResult<Option<String>>;

    /// Window caption
    fn caption(&self, key: &str) -> GuiResult<Option<String>>;

    /// Cache keys of the direct children
    fn children(&self, key: &str) -> GuiResult<Vec<String>>;

    /// Release cached child objects created while counting
    fn release(&self, keys: &[String]) -> GuiResult<()>;

    /// Class name
    fn class_name(&self, key: &str) -> GuiResult<Option<String>>;

    /// Index of the object among siblings of the same class
    fn class_index(&self, key: &str) -> GuiResult<Option<String>>;

    /// Native id
    fn id(&self, key: &str) -> GuiResult<Option<String>>;

    /// Depth in the object hierarchy
    fn level(&self, key: &str) -> GuiResult<i32>;

    /// Child of `parent` matching a recognition string
    fn matching_child_object(&self, parent: &str, recognition: &str) -> GuiResult<Option<String>>;

    /// Top-level window matching a recognition string
    fn matching_parent_object(&self, recognition: &str) -> GuiResult<Option<String>>;

    /// Node under `key` at `path` (`"Root->Branch->Leaf"`)
    fn matching_path_object(&self, key: &str, path: &str) -> GuiResult<Option<String>>;

    /// Accessible name
    fn accessible_name(&self, key: &str) -> GuiResult<Option<String>>;

    /// Toolkit name, ignoring accessibility
    fn non_accessible_name(&self, key: &str) -> GuiResult<Option<String>>;

    /// Property value
    fn property(&self, key: &str, name: &str) -> GuiResult<Option<String>>;

    /// Names of readable properties
    fn property_names(&self, key: &str) -> GuiResult<Vec<String>>;

    /// Superclass names, nearest first
    fn super_class_names(&self, key: &str) -> GuiResult<Vec<String>>;

    /// Visible text
    fn text(&self, key: &str) -> GuiResult<Option<String>>;

    /// Cache keys of all top-level windows
    fn top_level_windows(&self) -> GuiResult<Vec<String>>;

    /// Whether a node exists under `key` at `path`
    fn is_matching_path(&self, key: &str, path: &str) -> GuiResult<bool>;

    /// Whether the object is on screen
    fn is_showing(&self, key: &str) -> GuiResult<bool>;

    /// Whether the key still refers to a live object
    fn is_valid(&self, key: &str) -> GuiResult<bool>;

    /// Bring a window to the front
    fn set_active_window(&self, key: &str) -> GuiResult<()>;

    /// Whether the object is a top-level popup container
    fn is_top_level_popup_container(&self, key: &str) -> GuiResult<bool>;

    /// Recognition string of the object at screen coordinates
    fn recognition_at(&self, x: i32, y: i32) -> GuiResult<Option<String>>;
}
