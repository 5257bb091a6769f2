//! Request/response contract between the trigger side and the page that owns the selection.
//!
//! The page side ([`PageAgent`]) owns the document and answers `CATCH` requests. The trigger side
//! ([`Background`]) validates context-menu selections, forwards them over a [`PageTransport`], and
//! turns failures into error notifications. [`PageAgent::serve`] speaks the same contract as JSON
//! lines, one request and one response per line.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::catch::CatchService;
use crate::app::feedback::FeedbackSink;
use crate::domain::document::{Document, TextSelection};
use crate::domain::model::CatchReport;
use crate::infra::clipboard::ClipboardSink;

pub const EXTENSION_NAME: &str = "Flutter Widget Catcher";

const MSG_COPIED: &str = "Widget copied successfully";
const MSG_COPY_UNAVAILABLE: &str = "Widget caught but clipboard is unavailable";
const MSG_FAILED: &str = "Failed to copy widget";
const MSG_ERROR: &str = "Error occurred while copying widget";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageCommand {
    /// Context-menu catch; carries the selection text as a hint.
    Catch,
    /// Keyboard-shortcut catch; the live selection is the hint.
    CatchShortcut,
}

/// Request sent to the page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub command: PageCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
}

impl PageRequest {
    pub fn catch(widget: impl Into<String>) -> Self {
        Self {
            command: PageCommand::Catch,
            widget: Some(widget.into()),
        }
    }
}

/// Reply from the page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    pub success: bool,
    pub message: String,
}

impl PageResponse {
    fn failed() -> Self {
        Self {
            success: false,
            message: MSG_FAILED.into(),
        }
    }

    fn error() -> Self {
        Self {
            success: false,
            message: MSG_ERROR.into(),
        }
    }
}

impl From<&CatchReport> for PageResponse {
    fn from(report: &CatchReport) -> Self {
        if !report.success {
            return Self::failed();
        }
        let message = if report.error_kind.is_some() {
            MSG_COPY_UNAVAILABLE
        } else {
            MSG_COPIED
        };
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Requests addressed to the extension runtime rather than the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeRequest {
    GetExtensionInfo,
    LogError { error: String },
    LogInfo { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    pub name: String,
    pub version: String,
}

impl Default for ExtensionInfo {
    fn default() -> Self {
        Self {
            name: EXTENSION_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Answer a runtime request. Only `GET_EXTENSION_INFO` produces a reply.
pub fn handle_runtime(request: &RuntimeRequest) -> Option<ExtensionInfo> {
    match request {
        RuntimeRequest::GetExtensionInfo => Some(ExtensionInfo::default()),
        RuntimeRequest::LogError { error } => {
            tracing::error!(%error, "page reported error");
            None
        }
        RuntimeRequest::LogInfo { message } => {
            tracing::info!(%message, "page reported info");
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IncomingMessage {
    Page(PageRequest),
    Runtime(RuntimeRequest),
}

/// Channel from the trigger side to the page.
pub trait PageTransport {
    fn send(&mut self, request: &PageRequest) -> Result<PageResponse>;
}

/// Page-side handler: owns the document and its live selection.
pub struct PageAgent<C, F> {
    document: Document,
    service: CatchService<C, F>,
    last_report: Option<CatchReport>,
}

impl<C: ClipboardSink, F: FeedbackSink> PageAgent<C, F> {
    pub fn new(document: Document, service: CatchService<C, F>) -> Self {
        Self {
            document,
            service,
            last_report: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn service(&self) -> &CatchService<C, F> {
        &self.service
    }

    /// Report from the most recent catch, if any.
    pub fn last_report(&self) -> Option<&CatchReport> {
        self.last_report.as_ref()
    }

    /// Handle one request against the current live selection.
    pub fn handle(&mut self, request: &PageRequest) -> PageResponse {
        let report = match request.command {
            PageCommand::Catch => {
                let hint = request.widget.as_deref().unwrap_or_default();
                Some(self.service.catch(&mut self.document, Some(hint)))
            }
            PageCommand::CatchShortcut => self.service.catch_shortcut(&mut self.document),
        };

        let response = report
            .as_ref()
            .map(PageResponse::from)
            .unwrap_or_else(PageResponse::failed);
        self.last_report = report;
        response
    }

    /// Serve JSON-line requests until `reader` is exhausted.
    ///
    /// A `CATCH` request first selects the first occurrence of its widget text, standing in for
    /// the user's selection on the page. Runtime log actions produce no output line.
    pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> Result<()> {
        for line in reader.lines() {
            let line = line.context("failed to read request line")?;
            if line.trim().is_empty() {
                continue;
            }

            let reply = match serde_json::from_str::<IncomingMessage>(&line) {
                Ok(IncomingMessage::Page(request)) => {
                    self.select_hint(&request);
                    Some(serde_json::to_string(&self.handle(&request))?)
                }
                Ok(IncomingMessage::Runtime(request)) => handle_runtime(&request)
                    .map(|info| serde_json::to_string(&info))
                    .transpose()?,
                Err(err) => {
                    tracing::error!(error = %err, "invalid request");
                    Some(serde_json::to_string(&PageResponse::error())?)
                }
            };

            if let Some(reply) = reply {
                writeln!(writer, "{reply}").context("failed to write response")?;
                writer.flush().context("failed to flush response")?;
            }
        }
        Ok(())
    }

    fn select_hint(&mut self, request: &PageRequest) {
        let Some(widget) = request.widget.as_deref().map(str::trim) else {
            return;
        };
        if request.command != PageCommand::Catch || widget.is_empty() {
            return;
        }
        if let Err(err) = self.document.select_text(widget, 0) {
            tracing::warn!(error = %err, "widget text not found; keeping current selection");
        }
    }
}

impl<C: ClipboardSink, F: FeedbackSink> PageTransport for PageAgent<C, F> {
    fn send(&mut self, request: &PageRequest) -> Result<PageResponse> {
        Ok(self.handle(request))
    }
}

/// Reasons a context-menu catch did not go through. Display text is user-facing.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Please select some text first")]
    NoSelection,
    #[error("Failed to communicate with page. Please refresh and try again.")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Failed to catch widget. Please try again.")]
    CatchFailed(PageResponse),
}

/// Trigger-side dispatcher for context-menu catches.
#[derive(Debug, Default, Clone, Copy)]
pub struct Background;

impl Background {
    /// Forward a context-menu selection to the page. Failures are also pushed to `feedback`.
    pub fn dispatch_catch<T: PageTransport, F: FeedbackSink>(
        &self,
        selection_text: Option<&str>,
        transport: &mut T,
        feedback: &mut F,
    ) -> Result<PageResponse, DispatchError> {
        let result = Self::forward(selection_text, transport);
        match &result {
            Ok(response) => tracing::info!(message = %response.message, "widget caught"),
            Err(err) => {
                tracing::warn!(error = %err, "widget catch failed");
                feedback.notify_error(&err.to_string());
            }
        }
        result
    }

    fn forward<T: PageTransport>(
        selection_text: Option<&str>,
        transport: &mut T,
    ) -> Result<PageResponse, DispatchError> {
        let widget = selection_text
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(DispatchError::NoSelection)?;

        let response = transport
            .send(&PageRequest::catch(widget))
            .map_err(|err| DispatchError::Transport(err.into()))?;

        if response.success {
            Ok(response)
        } else {
            Err(DispatchError::CatchFailed(response))
        }
    }
}

/// Read the live selection of `document` as a context menu would report it.
pub fn context_menu_selection(document: &Document) -> Option<String> {
    let text = document.selected_text();
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::app::expander::SelectionExpander;
    use crate::app::feedback::Snackbar;
    use crate::infra::clipboard::MemoryClipboard;

    fn agent(text: &str, clipboard: MemoryClipboard) -> PageAgent<MemoryClipboard, Snackbar> {
        let service =
            CatchService::new(SelectionExpander::default(), clipboard, Snackbar::default());
        PageAgent::new(Document::new(text), service)
    }

    struct BrokenTransport;

    impl PageTransport for BrokenTransport {
        fn send(&mut self, _request: &PageRequest) -> Result<PageResponse> {
            anyhow::bail!("receiving end does not exist")
        }
    }

    #[test]
    fn request_wire_format() {
        let request = PageRequest::catch("Container");
        assert_snapshot!(
            serde_json::to_string(&request).unwrap(),
            @r#"{"command":"CATCH","widget":"Container"}"#
        );
        let parsed: PageRequest = serde_json::from_str(r#"{"command":"CATCH_SHORTCUT"}"#).unwrap();
        assert_eq!(parsed.command, PageCommand::CatchShortcut);
        assert_eq!(parsed.widget, None);
    }

    #[test]
    fn catch_uses_live_selection_not_hint() {
        let clipboard = MemoryClipboard::new();
        let mut agent = agent("Row(children: []), Text('x')", clipboard.clone());
        agent.document_mut().select_text("Text", 0).unwrap();

        let response = agent.handle(&PageRequest::catch("Row"));
        assert!(response.success);
        assert_eq!(response.message, "Widget copied successfully");
        assert_eq!(clipboard.last().as_deref(), Some("Text('x')"));
        assert_eq!(
            agent.last_report().and_then(|r| r.display_name.as_deref()),
            Some("Text")
        );
    }

    #[test]
    fn empty_selection_reports_failure() {
        let mut agent = agent("Text('x')", MemoryClipboard::new());
        let response = agent.handle(&PageRequest::catch("Text"));
        assert_eq!(
            response,
            PageResponse {
                success: false,
                message: "Failed to copy widget".into()
            }
        );
    }

    #[test]
    fn clipboard_failure_still_succeeds() {
        let mut agent = agent("Text('x')", MemoryClipboard::failing());
        agent.document_mut().select_text("Text", 0).unwrap();
        let response = agent.handle(&PageRequest::catch("Text"));
        assert!(response.success);
        assert_eq!(response.message, MSG_COPY_UNAVAILABLE);
        assert_eq!(agent.service().feedback().errors().len(), 1);
    }

    #[test]
    fn background_rejects_blank_selection() {
        let mut agent = agent("Text('x')", MemoryClipboard::new());
        let mut feedback = Snackbar::default();
        let result = Background.dispatch_catch(Some("   "), &mut agent, &mut feedback);
        assert!(matches!(result, Err(DispatchError::NoSelection)));
        assert_eq!(feedback.errors(), ["Please select some text first".to_string()]);
    }

    #[test]
    fn background_reports_transport_errors() {
        let mut feedback = Snackbar::default();
        let result = Background.dispatch_catch(Some("Text"), &mut BrokenTransport, &mut feedback);
        assert!(matches!(result, Err(DispatchError::Transport(_))));
        assert_eq!(
            feedback.errors(),
            ["Failed to communicate with page. Please refresh and try again.".to_string()]
        );
    }

    #[test]
    fn background_forwards_trimmed_selection() {
        let clipboard = MemoryClipboard::new();
        let mut agent = agent("Text('x')", clipboard.clone());
        agent.document_mut().select_text("Text", 0).unwrap();
        let selection = context_menu_selection(agent.document());

        let mut feedback = Snackbar::default();
        let response = Background
            .dispatch_catch(selection.as_deref(), &mut agent, &mut feedback)
            .unwrap();
        assert!(response.success);
        assert!(feedback.errors().is_empty());
        assert_eq!(clipboard.last().as_deref(), Some("Text('x')"));
    }

    #[test]
    fn serve_answers_each_line() {
        let clipboard = MemoryClipboard::new();
        let mut agent = agent("Padding(child: Text('a'))", clipboard.clone());
        let input = concat!(
            r#"{"command":"CATCH","widget":"Text"}"#,
            "\n",
            r#"{"action":"GET_EXTENSION_INFO"}"#,
            "\n",
            r#"{"action":"LOG_INFO","message":"ready"}"#,
            "\n",
            "not json\n",
        );

        let mut output = Vec::new();
        agent.serve(input.as_bytes(), &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_snapshot!(lines[0], @r#"{"success":true,"message":"Widget copied successfully"}"#);
        assert!(lines[1].contains(r#""name":"Flutter Widget Catcher""#));
        assert_snapshot!(lines[2], @r#"{"success":false,"message":"Error occurred while copying widget"}"#);
        assert_eq!(clipboard.last().as_deref(), Some("Text('a')"));
    }
}
