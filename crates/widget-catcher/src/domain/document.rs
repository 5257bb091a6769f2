//! Host document with a single live selection.

use crate::domain::errors::DocumentError;
use crate::domain::model::{Direction, SelectionRange};

/// Cursor over a document's character stream.
///
/// Growth is monotonic per direction until the selection is collapsed or restored.
pub trait TextSelection {
    /// Text currently covered by the selection.
    fn selected_text(&self) -> String;

    /// Grow the selection by one character. Returns the newly covered character, or `None` at the
    /// document boundary.
    fn extend(&mut self, direction: Direction) -> Option<char>;

    /// Collapse the selection to its start.
    fn collapse_to_start(&mut self);

    fn snapshot(&self) -> SelectionRange;

    fn restore(&mut self, range: SelectionRange);
}

/// Source text plus the one selection object every trigger shares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    chars: Vec<char>,
    selection: SelectionRange,
}

impl Document {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            chars: text.as_ref().chars().collect(),
            selection: SelectionRange::default(),
        }
    }

    /// Number of characters in the document.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn selection(&self) -> SelectionRange {
        self.selection
    }

    /// Select the char range `[start, end)`, clamped to the document.
    pub fn select_range(&mut self, start: usize, end: usize) -> SelectionRange {
        let len = self.chars.len();
        self.selection = SelectionRange::new(start.min(len), end.min(len));
        self.selection
    }

    /// Select the `occurrence`-th (0-based) appearance of `needle`.
    pub fn select_text(
        &mut self,
        needle: &str,
        occurrence: usize,
    ) -> Result<SelectionRange, DocumentError> {
        let needle: Vec<char> = needle.chars().collect();
        if needle.is_empty() {
            return Err(DocumentError::EmptyNeedle);
        }

        let start = self
            .chars
            .windows(needle.len())
            .enumerate()
            .filter(|(_, window)| *window == needle.as_slice())
            .map(|(idx, _)| idx)
            .nth(occurrence)
            .ok_or_else(|| DocumentError::TextNotFound {
                needle: needle.iter().collect(),
                occurrence,
            })?;

        Ok(self.select_range(start, start + needle.len()))
    }

    pub fn select_all(&mut self) -> SelectionRange {
        self.select_range(0, self.chars.len())
    }
}

impl TextSelection for Document {
    fn selected_text(&self) -> String {
        self.chars[self.selection.start..self.selection.end]
            .iter()
            .collect()
    }

    fn extend(&mut self, direction: Direction) -> Option<char> {
        match direction {
            Direction::Forward => {
                let ch = self.chars.get(self.selection.end).copied()?;
                self.selection.end += 1;
                Some(ch)
            }
            Direction::Backward => {
                let start = self.selection.start.checked_sub(1)?;
                self.selection.start = start;
                Some(self.chars[start])
            }
        }
    }

    fn collapse_to_start(&mut self) {
        self.selection.end = self.selection.start;
    }

    fn snapshot(&self) -> SelectionRange {
        self.selection
    }

    fn restore(&mut self, range: SelectionRange) {
        self.select_range(range.start, range.end);
    }
}
