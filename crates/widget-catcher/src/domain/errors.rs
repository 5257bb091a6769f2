//! Domain-specific errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures a catch can surface to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CatchError {
    /// Nothing but whitespace was selected.
    #[error("selection is empty")]
    EmptySelection,
    /// The expansion was computed but no clipboard backend accepted it.
    #[error("clipboard is unavailable")]
    ClipboardUnavailable,
}

/// Errors raised while placing a selection inside a [`Document`](super::document::Document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("text '{needle}' not found in document (occurrence {occurrence})")]
    TextNotFound { needle: String, occurrence: usize },
    #[error("cannot select empty text")]
    EmptyNeedle,
}

/// Raised when every clipboard backend rejects a write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to copy text to clipboard using available backends: {attempts:?}")]
pub struct ClipboardError {
    pub attempts: Vec<String>,
}
