//! Platform abstraction for the image scale engine.
//!
//! The engine decides what happens to the document; implementations of
//! [`ScalePlatform`] carry it out against a real document (the browser DOM) or
//! an in-memory one in tests.

use std::fmt::Debug;

use crate::style::InlineStyle;

/// Error type for platform operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Document operations needed to select, resize and release an image.
pub trait ScalePlatform {
    /// Handle to an element of the document.
    type Node: Clone + PartialEq + Debug;

    /// Whether `node` is an `<img>` element.
    fn is_image(&self, node: &Self::Node) -> bool;

    /// Current rendered width of `node` in CSS pixels.
    fn rendered_width(&self, node: &Self::Node) -> f64;

    /// Raw `style` attribute of `node`, `None` when it has none.
    fn inline_style(&self, node: &Self::Node) -> Option<String>;

    /// Replace the `style` attribute of `node`; `None` removes it.
    fn set_inline_style(&self, node: &Self::Node, style: Option<&str>) -> Result<(), PlatformError>;

    /// Insert a scale wrapper with `style` right before `image` and move the
    /// image into it. Returns the wrapper.
    fn wrap(&self, image: &Self::Node, style: &InlineStyle) -> Result<Self::Node, PlatformError>;

    /// Put `image` back where `wrapper` is and remove the wrapper.
    fn unwrap(&self, wrapper: &Self::Node, image: &Self::Node) -> Result<(), PlatformError>;

    /// Closest editable ancestor of `node`.
    fn editable_host(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Inline `caret-color` of `host`, empty when not set.
    fn caret_color(&self, host: &Self::Node) -> String;

    /// Set the inline `caret-color` of `host`; an empty value removes it.
    fn set_caret_color(&self, host: &Self::Node, color: &str) -> Result<(), PlatformError>;

    /// Collapse the text cursor just after `wrapper`: at its next sibling, or
    /// at the wrapper itself when it is the last child.
    fn collapse_caret_after(&self, wrapper: &Self::Node) -> Result<(), PlatformError>;

    /// Drop any text selection in the document.
    fn clear_text_selection(&self) -> Result<(), PlatformError>;
}
