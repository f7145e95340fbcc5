//! Structured error types for the folio renderer.
//!
//! Every failure aborts the render: either a complete document comes back
//! or an error does. There is no partial-success mode.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FolioError>;

/// The unified error type returned by all public folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// A required statement attribute was not supplied. Raised at
    /// construction, before anything is drawn.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// An image (or font) source could not be fetched or decoded.
    #[error("Asset error for '{source_ref}': {reason}")]
    Asset { source_ref: String, reason: String },

    /// Text could not be placed under the requested overflow strategy.
    #[error("Overflow: {0}")]
    Overflow(String),

    /// A box-stack or cursor invariant was violated. Programmer error.
    #[error("Layout invariant violated: {0}")]
    LayoutInvariant(String),

    /// Inline markup used a tag outside the supported vocabulary or was
    /// malformed.
    #[error("Invalid markup: {0}")]
    Markup(String),

    /// JSON input failed to parse as a valid statement.
    #[error("Failed to parse statement: {}{}", .source, hint_suffix(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },

    /// A custom font could not be loaded, parsed, or embedded.
    #[error("Font error: {0}")]
    FontError(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl FolioError {
    pub(crate) fn asset(source_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        FolioError::Asset {
            source_ref: source_ref.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the statement schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::ParseError { source: e, hint }
    }
}
