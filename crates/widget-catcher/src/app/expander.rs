//! Bracket-balanced expansion of a widget-name selection.
//!
//! The expander walks the live selection one character at a time: it checks for a `(` right after
//! the selection, otherwise anchors on the capitalized widget name behind it and walks forward to
//! the first `(`, then keeps extending until every bracket opened since that point is closed.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::document::TextSelection;
use crate::domain::errors::CatchError;
use crate::domain::model::{BracketStack, Direction, Expansion, ExpansionPath};
use crate::infra::config::Config;

/// Maximum backward steps spent looking for the widget name's first letter.
pub const BACKWARD_ANCHOR_BUDGET: usize = 50;
/// Maximum forward steps spent looking for the opening parenthesis.
pub const FORWARD_ANCHOR_BUDGET: usize = 100;
/// Maximum forward steps spent balancing brackets.
pub const BALANCE_BUDGET: usize = 10_000;

/// Name shown when no widget name can be extracted.
pub const DEFAULT_DISPLAY_NAME: &str = "Widget";

static WIDGET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][A-Za-z0-9_]*)\s*\(").expect("valid widget name pattern"));

/// Iteration ceilings for each phase of the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionBudgets {
    pub backward_anchor: usize,
    pub forward_anchor: usize,
    pub balance: usize,
}

impl Default for ExpansionBudgets {
    fn default() -> Self {
        Self {
            backward_anchor: BACKWARD_ANCHOR_BUDGET,
            forward_anchor: FORWARD_ANCHOR_BUDGET,
            balance: BALANCE_BUDGET,
        }
    }
}

/// Grows a selection to the smallest enclosing widget call.
#[derive(Debug, Clone, Default)]
pub struct SelectionExpander {
    budgets: ExpansionBudgets,
}

impl SelectionExpander {
    pub fn new(budgets: ExpansionBudgets) -> Self {
        Self { budgets }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.budgets.to_expansion_budgets())
    }

    pub fn budgets(&self) -> ExpansionBudgets {
        self.budgets
    }

    /// Expand the live selection in place and return the final text.
    ///
    /// Only an empty selection is an error; every other exit yields best-effort text.
    pub fn expand<S: TextSelection + ?Sized>(
        &self,
        selection: &mut S,
    ) -> Result<Expansion, CatchError> {
        if selection.selected_text().trim().is_empty() {
            tracing::warn!("empty selection");
            return Err(CatchError::EmptySelection);
        }

        let original = selection.snapshot();
        let mut stack = BracketStack::new();

        selection.extend(Direction::Forward);
        let path = if selection.selected_text().ends_with('(') {
            stack.push('(');
            ExpansionPath::DirectHit
        } else {
            selection.collapse_to_start();
            self.anchor_backward(selection);

            if !self.anchor_forward(selection, &mut stack) {
                selection.restore(original);
                let text = selection.selected_text().trim().to_owned();
                tracing::debug!(%text, "no opening bracket near selection; keeping original");
                return Ok(Expansion {
                    text,
                    path: ExpansionPath::NoOpeningBracket,
                });
            }
            ExpansionPath::Anchored
        };

        let path = self.balance(selection, &mut stack).unwrap_or(path);

        let text = selection.selected_text().trim().to_owned();
        if !text.contains('(') || !text.contains(')') {
            tracing::warn!(%text, "selected text does not look like a widget call");
        }

        Ok(Expansion { text, path })
    }

    /// Walk backward until a capital letter leads a selection longer than one character.
    fn anchor_backward<S: TextSelection + ?Sized>(&self, selection: &mut S) {
        for _ in 0..self.budgets.backward_anchor {
            selection.extend(Direction::Backward);
            let text = selection.selected_text();
            let mut chars = text.chars();
            if chars.next().is_some_and(|ch| ch.is_ascii_uppercase()) && chars.next().is_some() {
                return;
            }
        }
    }

    /// Walk forward to the first `(`, pushing it. Returns whether one was found.
    fn anchor_forward<S: TextSelection + ?Sized>(
        &self,
        selection: &mut S,
        stack: &mut BracketStack,
    ) -> bool {
        for _ in 0..self.budgets.forward_anchor {
            if selection.extend(Direction::Forward) == Some('(') {
                stack.push('(');
                return true;
            }
        }
        false
    }

    /// Extend until the stack empties. Returns the degraded path when balancing stops early.
    fn balance<S: TextSelection + ?Sized>(
        &self,
        selection: &mut S,
        stack: &mut BracketStack,
    ) -> Option<ExpansionPath> {
        let mut attempts = 0;
        while !stack.is_empty() {
            if attempts >= self.budgets.balance {
                tracing::warn!(
                    budget = self.budgets.balance,
                    open = stack.len(),
                    "bracket budget exhausted before balancing"
                );
                return Some(ExpansionPath::BudgetExhausted);
            }
            attempts += 1;

            match selection.extend(Direction::Forward) {
                Some(ch) => {
                    stack.feed(ch);
                }
                None => {
                    tracing::warn!("reached end of document while looking for closing brackets");
                    stack.clear();
                    return Some(ExpansionPath::EndOfDocument);
                }
            }
        }
        None
    }
}

/// Widget name for display: the first `Name(` in `text`, or `"Widget"`.
pub fn extract_display_name(text: &str) -> String {
    WIDGET_NAME
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_owned())
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::document::Document;

    fn expand(text: &str, needle: &str) -> Expansion {
        let mut doc = Document::new(text);
        doc.select_text(needle, 0).expect("needle present");
        SelectionExpander::default()
            .expand(&mut doc)
            .expect("expansion succeeds")
    }

    #[test]
    fn direct_hit_expands_nested_call() {
        let source = r#"Container(child: Column(children: [Text("Hello")]))"#;
        let expansion = expand(source, "Container");
        assert_eq!(expansion.text, source);
        assert_eq!(expansion.path, ExpansionPath::DirectHit);
    }

    #[test]
    fn direct_hit_stops_at_matching_paren() {
        let expansion = expand("Text('Hi'), const SizedBox()", "Text");
        assert_eq!(expansion.text, "Text('Hi')");
    }

    #[test]
    fn short_call_is_a_direct_hit() {
        let expansion = expand("Text('Hi')", "Text");
        assert_eq!(expansion.text, "Text('Hi')");
        assert_eq!(expansion.path, ExpansionPath::DirectHit);
    }

    #[test]
    fn anchors_when_paren_is_not_adjacent() {
        let source = "Padding (padding: EdgeInsets.all(8), child: Text('a'));";
        let expansion = expand(source, "Padding");
        assert_eq!(
            expansion.text,
            "Padding (padding: EdgeInsets.all(8), child: Text('a'))"
        );
        assert_eq!(expansion.path, ExpansionPath::Anchored);
    }

    #[test]
    fn anchors_on_capital_two_steps_back() {
        let expansion = expand("child: Text ('Hi')", "xt");
        assert_eq!(expansion.text, "Text ('Hi')");
        assert_eq!(expansion.path, ExpansionPath::Anchored);
    }

    #[test]
    fn anchors_at_document_start_from_partial_name() {
        let source = "Center (child: Icon(Icons.add))";
        let expansion = expand(source, "ente");
        assert_eq!(expansion.text, source);
    }

    #[test]
    fn whitespace_only_selection_is_empty() {
        let mut doc = Document::new("Text('a')   ");
        doc.select_range(9, 12);
        let result = SelectionExpander::default().expand(&mut doc);
        assert_eq!(result, Err(CatchError::EmptySelection));
        assert_eq!(doc.selection().start, 9);
        assert_eq!(doc.selection().end, 12);
    }

    #[test]
    fn missing_paren_restores_original_selection() {
        let mut doc = Document::new("Container");
        let original = doc.select_all();
        let expansion = SelectionExpander::default().expand(&mut doc).unwrap();
        assert_eq!(expansion.text, "Container");
        assert_eq!(expansion.path, ExpansionPath::NoOpeningBracket);
        assert_eq!(doc.selection(), original);
    }

    #[test]
    fn forward_budget_gives_up_on_distant_paren() {
        let source = format!("Name{}(x)", " ".repeat(120));
        let mut doc = Document::new(&source);
        doc.select_text("Name", 0).unwrap();

        let expansion = SelectionExpander::default().expand(&mut doc).unwrap();
        assert_eq!(expansion.text, "Name");
        assert_eq!(expansion.path, ExpansionPath::NoOpeningBracket);
        assert_eq!(doc.selection().start, 0);
        assert_eq!(doc.selection().end, 4);
    }

    #[test]
    fn forward_budget_reaches_paren_within_limit() {
        let source = format!("Name{}(x)", " ".repeat(90));
        let expansion = expand(&source, "Name");
        assert_eq!(expansion.text, source);
        assert_eq!(expansion.path, ExpansionPath::Anchored);
    }

    #[test]
    fn backward_budget_stops_before_distant_capital() {
        let source = format!("X{} name (a)", "a".repeat(60));
        let expansion = expand(&source, "name");
        assert_eq!(expansion.text, format!("{} name (a)", "a".repeat(49)));
        assert_eq!(expansion.path, ExpansionPath::Anchored);
    }

    #[test]
    fn larger_backward_budget_reaches_the_capital() {
        let source = format!("X{} name (a)", "a".repeat(60));
        let mut doc = Document::new(&source);
        doc.select_text("name", 0).unwrap();
        let expander = SelectionExpander::new(ExpansionBudgets {
            backward_anchor: 62,
            ..ExpansionBudgets::default()
        });

        let expansion = expander.expand(&mut doc).unwrap();
        assert_eq!(expansion.text, source);
        assert_eq!(expansion.path, ExpansionPath::Anchored);
    }

    #[test]
    fn malformed_input_degrades_at_end_of_document() {
        let source = "Container(child: Column(";
        let expansion = expand(source, "Container");
        assert_eq!(expansion.text, source);
        assert_eq!(expansion.path, ExpansionPath::EndOfDocument);
    }

    #[test]
    fn balance_budget_caps_the_walk() {
        let mut doc = Document::new("Row(children: [a, b, c])");
        doc.select_text("Row", 0).unwrap();
        let expander = SelectionExpander::new(ExpansionBudgets {
            balance: 5,
            ..ExpansionBudgets::default()
        });
        let expansion = expander.expand(&mut doc).unwrap();
        assert_eq!(expansion.text, "Row(child");
        assert_eq!(expansion.path, ExpansionPath::BudgetExhausted);
    }

    #[test]
    fn mismatched_closer_keeps_scanning() {
        // The stray `]` is recorded, so the outer `)` cannot close the call.
        let source = "Foo(a]) tail";
        let expansion = expand(source, "Foo");
        assert_eq!(expansion.text, source);
        assert_eq!(expansion.path, ExpansionPath::EndOfDocument);
    }

    #[test]
    fn expanding_the_result_again_is_stable() {
        let source = "Column(children: [Text('a'), Text('b')])";
        let first = expand(source, "Column");

        let mut doc = Document::new(&first.text);
        doc.select_all();
        let second = SelectionExpander::default().expand(&mut doc).unwrap();
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn multiline_widget_is_trimmed() {
        let source = "  Container(\n    padding: EdgeInsets.all(16.0),\n  )\n";
        let expansion = expand(source, "Container");
        assert_eq!(
            expansion.text,
            "Container(\n    padding: EdgeInsets.all(16.0),\n  )"
        );
    }

    #[test]
    fn display_name_extraction() {
        assert_eq!(extract_display_name("Container("), "Container");
        assert_eq!(extract_display_name("Text(\"Hello\")"), "Text");
        assert_eq!(extract_display_name("child: Sized_Box2 ("), "Sized_Box2");
        assert_eq!(extract_display_name("invalid text"), "Widget");
        assert_eq!(extract_display_name(""), "Widget");
    }
}
