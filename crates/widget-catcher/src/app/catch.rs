//! End-to-end catch: expand the live selection, copy it, and report back.

use crate::app::expander::{DEFAULT_DISPLAY_NAME, SelectionExpander, extract_display_name};
use crate::app::feedback::{FeedbackSink, copied_message};
use crate::app::usage::UsageStore;
use crate::domain::document::TextSelection;
use crate::domain::errors::CatchError;
use crate::domain::model::{CatchReport, CopyMethod};
use crate::infra::clipboard::ClipboardSink;

/// Wires the expander to a clipboard, a feedback sink, and an optional usage counter.
pub struct CatchService<C, F> {
    expander: SelectionExpander,
    clipboard: C,
    feedback: F,
    usage: Option<UsageStore>,
}

impl<C: ClipboardSink, F: FeedbackSink> CatchService<C, F> {
    pub fn new(expander: SelectionExpander, clipboard: C, feedback: F) -> Self {
        Self {
            expander,
            clipboard,
            feedback,
            usage: None,
        }
    }

    /// Count successful catches in `store`.
    pub fn with_usage(mut self, store: UsageStore) -> Self {
        self.usage = Some(store);
        self
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Catch the widget under the live selection.
    ///
    /// `hint` is the text the trigger saw when it fired. It only feeds display-name extraction;
    /// the live selection drives the expansion.
    pub fn catch<S: TextSelection + ?Sized>(
        &mut self,
        selection: &mut S,
        hint: Option<&str>,
    ) -> CatchReport {
        let expansion = match self.expander.expand(selection) {
            Ok(expansion) => expansion,
            Err(err) => {
                tracing::warn!(error = %err, "catch aborted");
                return CatchReport::failure(err);
            }
        };

        if expansion.path.is_degraded() {
            tracing::info!(path = ?expansion.path, "degraded expansion");
        }

        let (copy, error_kind) = match self.clipboard.copy(&expansion.text) {
            Ok(method) => (method, None),
            Err(err) => {
                tracing::error!(error = %err, "failed to copy to clipboard");
                (CopyMethod::Skipped, Some(CatchError::ClipboardUnavailable))
            }
        };

        let display_name = display_name_for(hint, &expansion.text);
        if error_kind.is_none() {
            self.feedback.show(&copied_message(&display_name));
        } else {
            self.feedback
                .notify_error(&format!("Clipboard unavailable; {display_name}() was not copied"));
        }
        self.record_usage();

        CatchReport {
            success: true,
            final_text: Some(expansion.text),
            display_name: Some(display_name),
            error_kind,
            path: Some(expansion.path),
            copy: Some(copy),
        }
    }

    /// Keyboard-shortcut trigger: acts only on a non-blank selection, which doubles as the hint.
    pub fn catch_shortcut<S: TextSelection + ?Sized>(
        &mut self,
        selection: &mut S,
    ) -> Option<CatchReport> {
        let hint = selection.selected_text();
        if hint.trim().is_empty() {
            return None;
        }
        Some(self.catch(selection, Some(&hint)))
    }

    fn record_usage(&self) {
        let Some(store) = &self.usage else {
            return;
        };
        match store.increment() {
            Ok(count) => tracing::debug!(count, "usage count updated"),
            Err(err) => tracing::warn!(error = %err, "failed to update usage count"),
        }
    }
}

/// Name from the final text, falling back to the hint.
fn display_name_for(hint: Option<&str>, final_text: &str) -> String {
    let name = extract_display_name(final_text);
    if name != DEFAULT_DISPLAY_NAME {
        return name;
    }
    hint.map(extract_display_name).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::feedback::Snackbar;
    use crate::domain::document::Document;
    use crate::infra::clipboard::MemoryClipboard;
    use std::time::Instant;

    fn service(clipboard: MemoryClipboard) -> CatchService<MemoryClipboard, Snackbar> {
        CatchService::new(SelectionExpander::default(), clipboard, Snackbar::default())
    }

    #[test]
    fn display_name_prefers_final_text() {
        assert_eq!(display_name_for(Some("Container"), "Container(x)"), "Container");
        assert_eq!(display_name_for(Some("Row("), "Column(x)"), "Column");
        assert_eq!(display_name_for(Some("Row("), "plain"), "Row");
        assert_eq!(display_name_for(None, "plain"), "Widget");
    }

    #[test]
    fn shortcut_ignores_blank_selection() {
        let mut doc = Document::new("   ");
        doc.select_all();
        let clipboard = MemoryClipboard::new();
        let mut service = service(clipboard.clone());
        assert!(service.catch_shortcut(&mut doc).is_none());
        assert!(clipboard.writes().is_empty());
    }

    #[test]
    fn shortcut_uses_live_selection() {
        let mut doc = Document::new("Text('Hi')");
        doc.select_text("Text", 0).unwrap();
        let clipboard = MemoryClipboard::new();
        let mut service = service(clipboard.clone());

        let report = service.catch_shortcut(&mut doc).expect("selection present");
        assert!(report.success);
        assert_eq!(clipboard.last().as_deref(), Some("Text('Hi')"));
        assert_eq!(
            service.feedback().visible_message(Instant::now()),
            Some("Copied Text()")
        );
    }
}
