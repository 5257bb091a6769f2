//! User-facing feedback for catches.

use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Receives catch outcomes for display.
pub trait FeedbackSink {
    /// Show a transient confirmation.
    fn show(&mut self, message: &str);

    /// Report a failed catch.
    fn notify_error(&mut self, message: &str);
}

/// Confirmation text for a copied widget.
pub fn copied_message(display_name: &str) -> String {
    format!("Copied {display_name}()")
}

/// Transient notification that hides itself once its duration elapses.
#[derive(Debug, Clone)]
pub struct Snackbar {
    duration: Duration,
    current: Option<(String, Instant)>,
    errors: Vec<String>,
}

impl Snackbar {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
            errors: Vec::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Message still on screen at `now`, if any.
    pub fn visible_message(&self, now: Instant) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|(_, shown_at)| now.saturating_duration_since(*shown_at) < self.duration)
            .map(|(message, _)| message.as_str())
    }

    /// Drop the message once it has expired.
    pub fn tick(&mut self, now: Instant) {
        if self.visible_message(now).is_none() {
            self.current = None;
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn show_at(&mut self, message: &str, now: Instant) {
        self.current = Some((message.to_owned(), now));
    }
}

impl Default for Snackbar {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

impl FeedbackSink for Snackbar {
    fn show(&mut self, message: &str) {
        self.show_at(message, Instant::now());
    }

    fn notify_error(&mut self, message: &str) {
        self.errors.push(message.to_owned());
    }
}

/// Snackbar that also echoes every message to stderr.
#[derive(Debug, Clone, Default)]
pub struct TerminalFeedback {
    snackbar: Snackbar,
}

impl TerminalFeedback {
    pub fn new(duration: Duration) -> Self {
        Self {
            snackbar: Snackbar::new(duration),
        }
    }

    pub fn snackbar(&self) -> &Snackbar {
        &self.snackbar
    }
}

impl FeedbackSink for TerminalFeedback {
    fn show(&mut self, message: &str) {
        self.snackbar.show(message);
        let _ = writeln!(io::stderr(), "{message}");
    }

    fn notify_error(&mut self, message: &str) {
        self.snackbar.notify_error(message);
        let _ = writeln!(io::stderr(), "error: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copied_message_format() {
        assert_eq!(copied_message("Container"), "Copied Container()");
    }

    #[test]
    fn snackbar_hides_after_duration() {
        let mut snackbar = Snackbar::new(Duration::from_millis(1500));
        let shown = Instant::now();
        snackbar.show_at("Copied Text()", shown);

        assert_eq!(snackbar.visible_message(shown), Some("Copied Text()"));
        assert_eq!(
            snackbar.visible_message(shown + Duration::from_millis(1499)),
            Some("Copied Text()")
        );
        assert_eq!(
            snackbar.visible_message(shown + Duration::from_millis(1500)),
            None
        );

        snackbar.tick(shown + Duration::from_secs(2));
        assert!(snackbar.visible_message(shown).is_none());
    }

    #[test]
    fn newer_message_replaces_older() {
        let mut snackbar = Snackbar::default();
        let now = Instant::now();
        snackbar.show_at("Copied Row()", now);
        snackbar.show_at("Copied Column()", now);
        assert_eq!(snackbar.visible_message(now), Some("Copied Column()"));
    }

    #[test]
    fn errors_are_collected() {
        let mut snackbar = Snackbar::default();
        snackbar.notify_error("Failed to copy widget");
        assert_eq!(snackbar.errors(), ["Failed to copy widget".to_string()]);
    }
}
