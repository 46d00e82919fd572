//! Error types for the editor core.

use miette::Diagnostic;
use smol_str::SmolStr;

/// Wrapper markup that cannot be collapsed into a plain image.
///
/// Offsets are byte offsets of the wrapper's opening tag in the field text.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizeError {
    #[error("scale wrapper at byte {offset} has no closing </{tag}>")]
    #[diagnostic(code(noteloom::normalize::unterminated))]
    Unterminated { offset: usize, tag: SmolStr },

    #[error("scale wrapper at byte {offset} contains a nested <{tag}>")]
    #[diagnostic(
        code(noteloom::normalize::nested),
        help("scale wrappers are created around a single image and never nest")
    )]
    Nested { offset: usize, tag: SmolStr },

    #[error("scale wrapper at byte {offset} does not contain an image")]
    #[diagnostic(code(noteloom::normalize::missing_image))]
    MissingImage { offset: usize },

    #[error("scale wrapper at byte {offset} contains more than one image")]
    #[diagnostic(code(noteloom::normalize::multiple_images))]
    MultipleImages { offset: usize },

    #[error("scale wrapper at byte {offset} contains content besides its image")]
    #[diagnostic(code(noteloom::normalize::stray_content))]
    StrayContent { offset: usize },

    #[error("scale wrapper at byte {offset} does not declare a pixel width")]
    #[diagnostic(code(noteloom::normalize::missing_width))]
    MissingWidth { offset: usize },

    #[error("scale wrapper at byte {offset} has an unreadable style: {source}")]
    #[diagnostic(code(noteloom::normalize::style))]
    Style {
        offset: usize,
        #[source]
        source: StyleError,
    },
}

/// An inline `style` attribute that cannot be split into declarations.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StyleError {
    #[error("`{decl}` is not a `property: value` declaration")]
    #[diagnostic(code(noteloom::style::declaration))]
    Declaration { decl: String },

    #[error("unclosed quote")]
    #[diagnostic(code(noteloom::style::quote))]
    UnclosedQuote,

    #[error("unclosed parenthesis")]
    #[diagnostic(code(noteloom::style::paren))]
    UnclosedParen,
}

/// A single field that failed to normalize during a flush.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("field {index}: {source}")]
pub struct FieldFailure {
    pub index: usize,
    #[source]
    pub source: NormalizeError,
}

/// Returned when one or more fields of a note could not be normalized.
///
/// Fields listed here were left exactly as they were handed in.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{} field(s) could not be normalized", failures.len())]
#[diagnostic(code(noteloom::flush))]
pub struct FlushError {
    pub failures: Vec<FieldFailure>,
}

/// Settings that could not be read.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("invalid editor settings: {0}")]
    #[diagnostic(code(noteloom::settings::json))]
    Json(#[from] serde_json::Error),
}
