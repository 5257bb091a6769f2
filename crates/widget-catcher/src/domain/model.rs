//! Domain models for bracket tracking and catch results.

use serde::{Deserialize, Serialize};

use crate::domain::errors::CatchError;

/// Direction a selection grows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Half-open range of char offsets into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// LIFO of currently open brackets.
///
/// Closers that do not match the top are pushed as-is, so a malformed document can leave the
/// stack non-empty even when a later closer would balance the original opener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BracketStack {
    open: Vec<char>,
}

impl BracketStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bracket: char) {
        self.open.push(bracket);
    }

    pub fn top(&self) -> Option<char> {
        self.open.last().copied()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn clear(&mut self) {
        self.open.clear();
    }

    pub fn as_slice(&self) -> &[char] {
        &self.open
    }

    /// Feed one character into the stack. Returns `true` when the character was a bracket.
    pub fn feed(&mut self, ch: char) -> bool {
        match ch {
            '(' | '{' | '[' => {
                self.open.push(ch);
                true
            }
            ')' | '}' | ']' => {
                if self.top() == opener_for(ch) {
                    self.open.pop();
                } else {
                    self.open.push(ch);
                }
                true
            }
            _ => false,
        }
    }
}

fn opener_for(closer: char) -> Option<char> {
    match closer {
        ')' => Some('('),
        '}' => Some('{'),
        ']' => Some('['),
        _ => None,
    }
}

/// Route the expander took before reaching its final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpansionPath {
    /// The character after the selection was `(`.
    DirectHit,
    /// The widget name was found by walking backward, then forward to `(`.
    Anchored,
    /// No `(` within the forward budget; the original selection was restored.
    NoOpeningBracket,
    /// The document ended before the brackets balanced.
    EndOfDocument,
    /// The balancing budget ran out before the brackets balanced.
    BudgetExhausted,
}

impl ExpansionPath {
    /// Whether this path produced best-effort text instead of a balanced call.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            ExpansionPath::NoOpeningBracket
                | ExpansionPath::EndOfDocument
                | ExpansionPath::BudgetExhausted
        )
    }
}

/// Text produced by one expander run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    pub path: ExpansionPath,
}

/// How the final text reached the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyMethod {
    Primary,
    Fallback,
    Skipped,
}

/// Structured outcome of a catch, handed back to whichever trigger started it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<CatchError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<ExpansionPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<CopyMethod>,
}

impl CatchReport {
    pub fn failure(error: CatchError) -> Self {
        Self {
            success: false,
            final_text: None,
            display_name: None,
            error_kind: Some(error),
            path: None,
            copy: None,
        }
    }
}
